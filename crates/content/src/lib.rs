//! Content Pipeline (component D): daily context ownership, skill
//! adaptation, consistency validation, just-in-time content generation,
//! performance tracking, question-type validation, and session state.

mod consistency;
mod daily_context;
mod generator;
mod jit_service;
mod performance_tracker;
mod question_registry;
mod session_state;
mod skill_adaptation;

pub use consistency::{ConsistencyValidator, ValidationOutcome};
pub use daily_context::{DailyContextRepository, DailyLearningContextManager};
pub use generator::{ContentGenerator, ContentRequest, FallbackContentProvider};
pub use jit_service::{GenerateContainerRequest, JustInTimeContentService, SubjectAssignment};
pub use performance_tracker::{Pattern, PerformanceTracker, QuestionAttempt};
pub use question_registry::QuestionTypeRegistry;
pub use session_state::SessionStateManager;
pub use skill_adaptation::SkillAdaptationService;
