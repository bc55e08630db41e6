//! Grade-average simulation and improvement planning.
//!
//! Subjects come in as plain data ([`Subject`]) from a grade source such as
//! [`gradebook::load_subjects`]. On top of them the crate offers:
//!
//! - [`SubjectSimulation`]: a per-subject what-if list of hypothetical grades.
//! - [`suggest_improvements`]: the fewest extra grades that lift a subject's
//!   rounded average to a target.
//! - [`plan_portfolio_improvement`]: which subjects to raise, and by how
//!   much, to reach an overall average target.

pub mod config;
pub mod error;
pub mod gradebook;
pub mod models;
pub mod portfolio;
pub mod report;
pub mod simulation;
pub mod suggest;

pub use error::{PlannerError, Result};
pub use models::{
    Grade, GradeRecord, GradeSuggestion, ImprovementPlan, PlannedImprovement, Subject, MAX_GRADE,
    MIN_GRADE,
};
pub use portfolio::{plan_portfolio_improvement, points_needed, Portfolio};
pub use simulation::{
    compute_average, AverageSubjectSimulation, GradeSimulation, SimulatedGradeId,
    SubjectSimulation,
};
pub use suggest::{improvement_suggestions, suggest_improvements};
