//! Component E: the Real-Time Multiplayer Game Orchestrator (§4.E).
//!
//! [`PerpetualRoomScheduler`] ticks rooms forward, [`PerpetualRoomManager`]
//! assembles a game's roster and transitions room lifecycle state, and
//! [`GameOrchestrator`] drives one session's question-by-question loop.
//! [`ai_agent`] and [`bingo`] hold the pure decision/detection logic those
//! depend on; [`careers`] is the static clue/career reference data.

pub mod ai_agent;
pub mod bingo;
pub mod broadcast;
pub mod careers;
pub mod orchestrator;
pub mod repository;
pub mod room_manager;
pub mod scheduler;

pub use ai_agent::{AiAgent, AiAgentService, AiDecision};
pub use broadcast::{RecordingBroadcaster, RoomBroadcaster, TokioBroadcastGateway};
pub use orchestrator::{new_click_channel, GameOrchestrator, IncomingClick};
pub use repository::GameRepository;
pub use room_manager::PerpetualRoomManager;
pub use scheduler::{HealthStatus, PerpetualRoomScheduler};
