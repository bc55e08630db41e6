/// Errors raised by the averaging engine for caller-supplied input.
///
/// An unreachable target is not an error: it shows up as an empty
/// suggestion list or as unmet points on the plan.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlannerError {
    #[error("grade {value} is outside the 1-10 scale")]
    GradeOutOfRange { value: i64 },

    #[error("average {value} is outside the 1-10 scale")]
    AverageOutOfRange { value: i64 },

    #[error("overall target {value} must be a finite number of at least 1")]
    InvalidOverallTarget { value: f64 },

    #[error("unknown subject: {name}")]
    UnknownSubject { name: String },
}

pub type Result<T> = std::result::Result<T, PlannerError>;
