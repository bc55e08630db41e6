use log::trace;

use crate::error::Result;
use crate::models::{validate_average, Grade, GradeSuggestion, Subject, MAX_GRADE};
use crate::simulation::{rounded_mean, SubjectSimulation};

/// Largest number of identical grades a single suggestion may ask for.
pub const MAX_REPEAT: u8 = 10;

/// Cheapest ways to lift the rounded average of `simulation` to `target`.
///
/// For every grade value, finds the smallest repeat count (up to
/// [`MAX_REPEAT`]) that reaches the target when added to the current
/// grades. Each trial starts again from the same base set. Results are
/// ordered by count, then by grade. An empty list means the target is
/// already met or cannot be reached within the cap.
pub fn improvement_suggestions(
    simulation: &SubjectSimulation<'_>,
    target: u8,
) -> Vec<GradeSuggestion> {
    let base = simulation.grade_values();
    let current = simulation.average();
    if target <= current {
        return Vec::new();
    }

    let mut suggestions = Vec::new();
    for grade in Grade::all() {
        let minimal = (1..=MAX_REPEAT).find(|&count| {
            let trial = base
                .iter()
                .copied()
                .chain(std::iter::repeat(grade).take(count as usize));
            let average = rounded_mean(trial).unwrap_or(MAX_GRADE);
            trace!(
                "{}: {} x {} -> {} (target {})",
                simulation.subject().name,
                count,
                grade,
                average,
                target
            );
            average >= target
        });
        if let Some(count) = minimal {
            suggestions.push(GradeSuggestion {
                count,
                grade: grade.value(),
            });
        }
    }

    suggestions.sort();
    suggestions
}

/// Suggestions for a bare list of grade values.
pub fn suggest_improvements(values: &[i64], target: i64) -> Result<Vec<GradeSuggestion>> {
    let target = validate_average(target)?;
    let subject = Subject::from_values("", values)?;
    Ok(improvement_suggestions(
        &SubjectSimulation::new(&subject),
        target,
    ))
}
