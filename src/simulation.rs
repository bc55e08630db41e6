use log::trace;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{validate_average, Grade, GradeSuggestion, Subject, MAX_GRADE};
use crate::suggest;

/// Mean of the grades rounded half up, or `None` for an empty set.
///
/// Integer arithmetic keeps x.5 exact: `(2 * sum + n) / (2 * n)`.
pub fn rounded_mean<I>(grades: I) -> Option<u8>
where
    I: IntoIterator<Item = Grade>,
{
    let (sum, count) = grades
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), grade| {
            (sum + grade.value() as u32, count + 1)
        });
    if count == 0 {
        return None;
    }
    Some(((2 * sum + count) / (2 * count)) as u8)
}

/// Rounded average of raw grade values. An empty list counts as a perfect 10.
pub fn compute_average(values: &[i64]) -> Result<u8> {
    let grades = values
        .iter()
        .map(|value| Grade::new(*value))
        .collect::<Result<Vec<_>>>()?;
    Ok(rounded_mean(grades).unwrap_or(MAX_GRADE))
}

/// Handle for a hypothetical grade, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimulatedGradeId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeSimulation {
    pub value: Grade,
    pub is_simulated: bool,
}

/// What-if view of one subject: its real grades plus hypothetical ones.
///
/// The subject itself is only borrowed; simulated grades never touch it.
#[derive(Debug, Clone)]
pub struct SubjectSimulation<'a> {
    subject: &'a Subject,
    simulated: Vec<(SimulatedGradeId, Grade)>,
    next_id: u64,
    target_average: Option<u8>,
    default_average: u8,
}

impl<'a> SubjectSimulation<'a> {
    pub fn new(subject: &'a Subject) -> Self {
        Self::with_default(subject, MAX_GRADE)
    }

    /// Uses `default_average` while the subject has neither real nor simulated grades.
    pub fn with_default(subject: &'a Subject, default_average: u8) -> Self {
        Self {
            subject,
            simulated: Vec::new(),
            next_id: 0,
            target_average: None,
            default_average,
        }
    }

    pub fn subject(&self) -> &'a Subject {
        self.subject
    }

    pub fn add_simulated_grade(&mut self, grade: Grade) -> SimulatedGradeId {
        let id = SimulatedGradeId(self.next_id);
        self.next_id += 1;
        self.simulated.push((id, grade));
        trace!(
            "{}: simulated grade {} added, average now {}",
            self.subject.name,
            grade,
            self.average()
        );
        id
    }

    /// Returns whether a grade was removed; unknown ids are ignored.
    pub fn remove_simulated_grade(&mut self, id: SimulatedGradeId) -> bool {
        let before = self.simulated.len();
        self.simulated.retain(|(existing, _)| *existing != id);
        self.simulated.len() != before
    }

    pub fn clear_simulated_grades(&mut self) {
        self.simulated.clear();
    }

    pub fn simulated_grades(&self) -> impl Iterator<Item = (SimulatedGradeId, Grade)> + '_ {
        self.simulated.iter().copied()
    }

    pub fn all_grades(&self) -> Vec<GradeSimulation> {
        self.subject
            .grades
            .iter()
            .map(|record| GradeSimulation {
                value: record.grade,
                is_simulated: false,
            })
            .chain(self.simulated.iter().map(|(_, grade)| GradeSimulation {
                value: *grade,
                is_simulated: true,
            }))
            .collect()
    }

    pub fn grade_values(&self) -> Vec<Grade> {
        self.all_grades().into_iter().map(|g| g.value).collect()
    }

    pub fn average(&self) -> u8 {
        rounded_mean(self.grade_values()).unwrap_or(self.default_average)
    }

    pub fn target_average(&self) -> Option<u8> {
        self.target_average
    }

    pub fn set_target_average(&mut self, target: Option<i64>) -> Result<()> {
        self.target_average = target.map(validate_average).transpose()?;
        Ok(())
    }

    /// Suggestions towards the configured target, 10 when none is set.
    pub fn suggestions(&self) -> Vec<GradeSuggestion> {
        suggest::improvement_suggestions(self, self.target_average.unwrap_or(MAX_GRADE))
    }
}

/// One row of the overall-average view: a subject and a user-overridable average.
#[derive(Debug, Clone)]
pub struct AverageSubjectSimulation<'a> {
    subject: &'a Subject,
    simulated_average: u8,
    original_average: u8,
    default_average: u8,
}

impl<'a> AverageSubjectSimulation<'a> {
    pub fn new(subject: &'a Subject) -> Self {
        Self::with_default(subject, MAX_GRADE)
    }

    /// Uses `default_average` for a subject that has no grades yet.
    pub fn with_default(subject: &'a Subject, default_average: u8) -> Self {
        let original_average = subject.natural_average_or(default_average);
        Self {
            subject,
            simulated_average: original_average,
            original_average,
            default_average,
        }
    }

    pub fn id(&self) -> Uuid {
        self.subject.id
    }

    pub fn subject(&self) -> &'a Subject {
        self.subject
    }

    pub fn simulated_average(&self) -> u8 {
        self.simulated_average
    }

    pub fn original_average(&self) -> u8 {
        self.original_average
    }

    /// A fresh what-if view of the real grades, sharing this row's default average.
    pub fn grade_simulation(&self) -> SubjectSimulation<'a> {
        SubjectSimulation::with_default(self.subject, self.default_average)
    }

    pub fn set_simulated_average(&mut self, average: i64) -> Result<()> {
        self.simulated_average = validate_average(average)?;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.simulated_average = self.original_average;
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated_average != self.original_average
    }
}

impl PartialEq for AverageSubjectSimulation<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.subject.id == other.subject.id
    }
}

impl Eq for AverageSubjectSimulation<'_> {}
