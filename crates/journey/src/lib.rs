//! Adaptive Journey Engine (component C): the per-(student, subject) state
//! machine that walks a student through diagnostic, in-cluster, and
//! cluster-complete phases until a subject is mastered.

mod engine;
mod repository;

pub use engine::JourneyEngine;
pub use repository::JourneyRepository;
