use std::fmt::Write;

use crate::models::{GradeRecord, ImprovementPlan, PlannedImprovement, Subject};
use crate::portfolio::Portfolio;

/// The five latest dated grades across all subjects, newest first.
pub fn recent_grades(subjects: &[Subject]) -> Vec<(&str, &GradeRecord)> {
    let mut recent: Vec<(&str, &GradeRecord)> = subjects
        .iter()
        .flat_map(|subject| {
            subject
                .grades
                .iter()
                .filter(|record| record.recorded_on.is_some())
                .map(move |record| (subject.name.as_str(), record))
        })
        .collect();
    recent.sort_by(|a, b| b.1.recorded_on.cmp(&a.1.recorded_on));
    recent.truncate(5);
    recent
}

/// One line describing how a subject reaches its planned average.
pub fn describe_improvement(improvement: &PlannedImprovement) -> String {
    let mut line = format!(
        "{}: {} -> {} (+{})",
        improvement.subject_name,
        improvement.current_average,
        improvement.target_average,
        improvement.point_increase
    );
    match improvement.suggestions.split_first() {
        None => line.push_str(", not achievable with up to 10 more grades"),
        Some((easiest, rest)) => {
            let _ = write!(line, ", add {}", easiest);
            if !rest.is_empty() {
                let alternatives: Vec<String> =
                    rest.iter().take(3).map(|s| s.to_string()).collect();
                let _ = write!(line, " (or {})", alternatives.join(", "));
            }
        }
    }
    line
}

pub fn build_report(
    subjects: &[Subject],
    portfolio: &Portfolio<'_>,
    plan: &ImprovementPlan,
    overall_target: f64,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Grade Averages Report");
    let _ = writeln!(output, "Target overall average: {:.2}", overall_target);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Subject Averages");

    if portfolio.is_empty() {
        let _ = writeln!(output, "No subjects to average.");
    } else {
        for simulation in portfolio.simulations() {
            let subject = simulation.subject();
            if simulation.is_simulated() {
                let _ = writeln!(
                    output,
                    "- {}: {} (simulated, real {}) from {} grades",
                    subject.name,
                    simulation.simulated_average(),
                    simulation.original_average(),
                    subject.grades.len()
                );
            } else {
                let _ = writeln!(
                    output,
                    "- {}: {} from {} grades",
                    subject.name,
                    simulation.simulated_average(),
                    subject.grades.len()
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall Average");
    match portfolio.overall_average() {
        Some(average) => {
            let _ = writeln!(output, "{:.2}", average);
        }
        None => {
            let _ = writeln!(output, "No subjects to average.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Improvement Plan");

    if plan.improvements.is_empty() && plan.is_fully_achievable() {
        let _ = writeln!(output, "Target already met.");
    } else if plan.improvements.is_empty() {
        let _ = writeln!(output, "Target is above the grading scale.");
    } else {
        for (rank, improvement) in plan.improvements.iter().enumerate() {
            let _ = writeln!(output, "{}. {}", rank + 1, describe_improvement(improvement));
        }
    }

    if !plan.is_fully_achievable() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Partially Achievable");
        let _ = writeln!(
            output,
            "{} of {} needed points could not be planned.",
            plan.unmet_points, plan.points_needed
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Grades");

    let recent = recent_grades(subjects);
    if recent.is_empty() {
        let _ = writeln!(output, "No dated grades recorded.");
    } else {
        for (name, record) in recent {
            let date = record
                .recorded_on
                .map(|date| date.to_string())
                .unwrap_or_default();
            match &record.note {
                Some(note) => {
                    let _ = writeln!(output, "- {} {} on {}: {}", name, record.grade, date, note);
                }
                None => {
                    let _ = writeln!(output, "- {} {} on {}", name, record.grade, date);
                }
            }
        }
    }

    output
}
