use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PlannerError, Result};

/// Lowest grade on the scale.
pub const MIN_GRADE: u8 = 1;
/// Highest grade on the scale, also the average assumed for a subject without grades.
pub const MAX_GRADE: u8 = 10;

/// A single grade value on the 1-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Grade(u8);

impl Grade {
    pub fn new(value: i64) -> Result<Self> {
        if (MIN_GRADE as i64..=MAX_GRADE as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(PlannerError::GradeOutOfRange { value })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Every grade on the scale, lowest first.
    pub fn all() -> impl Iterator<Item = Grade> {
        (MIN_GRADE..=MAX_GRADE).map(Grade)
    }
}

impl TryFrom<i64> for Grade {
    type Error = PlannerError;

    fn try_from(value: i64) -> Result<Self> {
        Grade::new(value)
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> u8 {
        grade.0
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Checks that a rounded average or target sits on the 1-10 scale.
pub fn validate_average(value: i64) -> Result<u8> {
    if (MIN_GRADE as i64..=MAX_GRADE as i64).contains(&value) {
        Ok(value as u8)
    } else {
        Err(PlannerError::AverageOutOfRange { value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub grade: Grade,
    pub recorded_on: Option<NaiveDate>,
    pub note: Option<String>,
}

impl GradeRecord {
    pub fn new(grade: Grade) -> Self {
        Self {
            grade,
            recorded_on: None,
            note: None,
        }
    }
}

/// A school subject and its real grades, as handed over by the grade source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub grades: Vec<GradeRecord>,
}

impl Subject {
    pub fn new(name: impl Into<String>, grades: Vec<GradeRecord>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            grades,
        }
    }

    /// Builds a subject from raw grade values, rejecting anything off the scale.
    pub fn from_values(name: impl Into<String>, values: &[i64]) -> Result<Self> {
        let grades = values
            .iter()
            .map(|value| Grade::new(*value).map(GradeRecord::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(name, grades))
    }

    pub fn grade_values(&self) -> Vec<Grade> {
        self.grades.iter().map(|record| record.grade).collect()
    }

    /// Rounded mean of the real grades, or `default` when there are none.
    pub fn natural_average_or(&self, default: u8) -> u8 {
        crate::simulation::rounded_mean(self.grades.iter().map(|record| record.grade))
            .unwrap_or(default)
    }

    pub fn natural_average(&self) -> u8 {
        self.natural_average_or(MAX_GRADE)
    }
}

/// "Add `count` grades of `grade` (or higher) to reach the target."
///
/// Field order drives the derived ordering: fewer grades first, then the
/// lowest sufficient grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GradeSuggestion {
    pub count: u8,
    pub grade: u8,
}

impl std::fmt::Display for GradeSuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 1 {
            write!(f, "one {}", self.grade)
        } else {
            write!(f, "{} x {}", self.count, self.grade)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedImprovement {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub current_average: u8,
    pub target_average: u8,
    pub point_increase: u8,
    pub suggestions: Vec<GradeSuggestion>,
}

impl PlannedImprovement {
    /// The cheapest way to reach the target, if any exists within the search cap.
    pub fn easiest(&self) -> Option<&GradeSuggestion> {
        self.suggestions.first()
    }

    pub fn is_achievable(&self) -> bool {
        !self.suggestions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImprovementPlan {
    pub improvements: Vec<PlannedImprovement>,
    pub points_needed: u32,
    pub unmet_points: u32,
}

impl ImprovementPlan {
    pub fn is_fully_achievable(&self) -> bool {
        self.unmet_points == 0
    }

    pub fn total_increase(&self) -> u32 {
        self.improvements
            .iter()
            .map(|improvement| improvement.point_increase as u32)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_rejects_values_off_the_scale() {
        assert_eq!(
            Grade::new(0),
            Err(PlannerError::GradeOutOfRange { value: 0 })
        );
        assert_eq!(
            Grade::new(11),
            Err(PlannerError::GradeOutOfRange { value: 11 })
        );
        assert_eq!(Grade::new(7).map(Grade::value), Ok(7));
    }

    #[test]
    fn average_validation_reports_average_error() {
        assert_eq!(validate_average(10), Ok(10));
        assert_eq!(
            validate_average(-1),
            Err(PlannerError::AverageOutOfRange { value: -1 })
        );
    }

    #[test]
    fn natural_average_defaults_when_empty() {
        let empty = Subject::new("Art", Vec::new());
        assert_eq!(empty.natural_average(), 10);
        assert_eq!(empty.natural_average_or(8), 8);

        let maths = Subject::from_values("Maths", &[6, 7]).unwrap();
        assert_eq!(maths.natural_average(), 7);
    }

    #[test]
    fn suggestions_order_by_count_then_grade() {
        let mut suggestions = vec![
            GradeSuggestion { count: 2, grade: 9 },
            GradeSuggestion { count: 1, grade: 10 },
            GradeSuggestion { count: 2, grade: 8 },
        ];
        suggestions.sort();
        assert_eq!(
            suggestions,
            vec![
                GradeSuggestion { count: 1, grade: 10 },
                GradeSuggestion { count: 2, grade: 8 },
                GradeSuggestion { count: 2, grade: 9 },
            ]
        );
    }

    #[test]
    fn grade_deserializes_through_validation() {
        let grade: Grade = serde_json::from_str("9").unwrap();
        assert_eq!(grade.value(), 9);
        assert!(serde_json::from_str::<Grade>("12").is_err());
    }
}
