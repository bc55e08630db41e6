use std::cmp::Ordering;

use log::debug;
use uuid::Uuid;

use crate::error::{PlannerError, Result};
use crate::models::{GradeSuggestion, ImprovementPlan, PlannedImprovement, Subject, MAX_GRADE};
use crate::simulation::AverageSubjectSimulation;
use crate::suggest::improvement_suggestions;

// Absorbs float noise in `target * n` so an exact target does not cost a phantom point.
const POINTS_EPSILON: f64 = 1e-9;

/// Whole rounded points the subject averages must gain so their mean reaches `target`.
pub fn points_needed(simulations: &[AverageSubjectSimulation<'_>], target: f64) -> u32 {
    let current: u32 = simulations
        .iter()
        .map(|simulation| simulation.simulated_average() as u32)
        .sum();
    let needed = (target * simulations.len() as f64 - current as f64 - POINTS_EPSILON).ceil();
    if needed <= 0.0 {
        0
    } else {
        needed as u32
    }
}

struct Selection<'s, 'a> {
    simulation: &'s AverageSubjectSimulation<'a>,
    target: u8,
    suggestions: Vec<GradeSuggestion>,
}

fn resolve(simulation: &AverageSubjectSimulation<'_>, target: u8) -> Vec<GradeSuggestion> {
    improvement_suggestions(&simulation.grade_simulation(), target)
}

fn by_easiest(a: &Selection<'_, '_>, b: &Selection<'_, '_>) -> Ordering {
    match (a.suggestions.first(), b.suggestions.first()) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Spreads the points needed for an overall `target` across subjects.
///
/// Subjects closest to 10 get +1 first. If every subject got its point and
/// demand remains, the same subjects are revisited and pushed further, up to
/// 10. Subjects never picked in the first pass are not reconsidered, so part
/// of the demand can stay unmet; that remainder is reported as
/// `unmet_points`. The result is ranked by each subject's easiest
/// suggestion; subjects without any reachable suggestion come last.
pub fn plan_portfolio_improvement(
    simulations: &[AverageSubjectSimulation<'_>],
    target: f64,
) -> Result<ImprovementPlan> {
    if !target.is_finite() || target < 1.0 {
        return Err(PlannerError::InvalidOverallTarget { value: target });
    }

    let needed = points_needed(simulations, target);
    if needed == 0 {
        debug!("overall target {target} already met");
        return Ok(ImprovementPlan::default());
    }
    if target > MAX_GRADE as f64 {
        debug!("overall target {target} is above the scale, {needed} points unmet");
        return Ok(ImprovementPlan {
            improvements: Vec::new(),
            points_needed: needed,
            unmet_points: needed,
        });
    }
    debug!("overall target {target} needs {needed} points");

    let mut pool: Vec<&AverageSubjectSimulation<'_>> = simulations
        .iter()
        .filter(|simulation| simulation.simulated_average() < MAX_GRADE)
        .collect();
    pool.sort_by(|a, b| b.simulated_average().cmp(&a.simulated_average()));

    let mut remaining = needed;
    let mut selected: Vec<Selection<'_, '_>> = Vec::new();

    for simulation in pool {
        if remaining == 0 {
            break;
        }
        let target = (simulation.simulated_average() + 1).min(MAX_GRADE);
        debug!("{}: +1 to {}", simulation.subject().name, target);
        selected.push(Selection {
            simulation,
            target,
            suggestions: resolve(simulation, target),
        });
        remaining -= 1;
    }

    if remaining > 0 {
        for selection in selected.iter_mut() {
            if remaining == 0 {
                break;
            }
            let possible = MAX_GRADE - selection.simulation.simulated_average();
            if possible > 1 {
                let additional = (possible - 1).min(remaining.min(u8::MAX as u32) as u8);
                selection.target += additional;
                selection.suggestions = resolve(selection.simulation, selection.target);
                remaining -= additional as u32;
                debug!(
                    "{}: +{} more to {}",
                    selection.simulation.subject().name,
                    additional,
                    selection.target
                );
            }
        }
    }

    if remaining > 0 {
        debug!("{remaining} of {needed} points left unmet");
    }

    selected.sort_by(by_easiest);

    let improvements = selected
        .into_iter()
        .map(|selection| {
            let subject = selection.simulation.subject();
            let current = selection.simulation.simulated_average();
            PlannedImprovement {
                subject_id: subject.id,
                subject_name: subject.name.clone(),
                current_average: current,
                target_average: selection.target,
                point_increase: selection.target - current,
                suggestions: selection.suggestions,
            }
        })
        .collect();

    Ok(ImprovementPlan {
        improvements,
        points_needed: needed,
        unmet_points: remaining,
    })
}

/// The overall-average view: one overridable average per visible subject.
#[derive(Debug, Clone)]
pub struct Portfolio<'a> {
    simulations: Vec<AverageSubjectSimulation<'a>>,
}

impl<'a> Portfolio<'a> {
    pub fn new(subjects: &'a [Subject]) -> Self {
        Self::with_options(subjects, &[], MAX_GRADE)
    }

    /// Leaves out `hidden` subjects (matched by name, ignoring case) and
    /// gives grade-less subjects `default_average`.
    pub fn with_options(subjects: &'a [Subject], hidden: &[String], default_average: u8) -> Self {
        let simulations = subjects
            .iter()
            .filter(|subject| {
                !hidden
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&subject.name))
            })
            .map(|subject| AverageSubjectSimulation::with_default(subject, default_average))
            .collect();
        Self { simulations }
    }

    pub fn simulations(&self) -> &[AverageSubjectSimulation<'a>] {
        &self.simulations
    }

    pub fn is_empty(&self) -> bool {
        self.simulations.is_empty()
    }

    /// Mean of the simulated averages, `None` with no visible subjects.
    pub fn overall_average(&self) -> Option<f64> {
        if self.simulations.is_empty() {
            return None;
        }
        let sum: u32 = self
            .simulations
            .iter()
            .map(|simulation| simulation.simulated_average() as u32)
            .sum();
        Some(sum as f64 / self.simulations.len() as f64)
    }

    pub fn set_simulated_average(&mut self, id: Uuid, average: i64) -> Result<()> {
        self.simulations
            .iter_mut()
            .find(|simulation| simulation.id() == id)
            .ok_or_else(|| PlannerError::UnknownSubject {
                name: id.to_string(),
            })?
            .set_simulated_average(average)
    }

    pub fn set_simulated_average_by_name(&mut self, name: &str, average: i64) -> Result<()> {
        self.simulations
            .iter_mut()
            .find(|simulation| simulation.subject().name.eq_ignore_ascii_case(name))
            .ok_or_else(|| PlannerError::UnknownSubject {
                name: name.to_string(),
            })?
            .set_simulated_average(average)
    }

    pub fn reset_simulations(&mut self) {
        for simulation in self.simulations.iter_mut() {
            simulation.reset();
        }
    }

    pub fn simulated_count(&self) -> usize {
        self.simulations
            .iter()
            .filter(|simulation| simulation.is_simulated())
            .count()
    }

    pub fn points_needed(&self, target: f64) -> u32 {
        points_needed(&self.simulations, target)
    }

    pub fn plan(&self, target: f64) -> Result<ImprovementPlan> {
        plan_portfolio_improvement(&self.simulations, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(name: &str, values: &[i64]) -> Subject {
        Subject::from_values(name, values).unwrap()
    }

    #[test]
    fn two_nines_each_get_one_point() {
        let subjects = vec![
            subject("Maths", &[9]),
            subject("English", &[9, 9]),
            subject("Sport", &[10]),
        ];
        let portfolio = Portfolio::new(&subjects);
        let plan = portfolio.plan(10.0).unwrap();

        assert_eq!(plan.points_needed, 2);
        assert!(plan.is_fully_achievable());
        assert_eq!(plan.improvements.len(), 2);
        for improvement in &plan.improvements {
            assert_eq!(improvement.point_increase, 1);
            assert_eq!(improvement.target_average, 10);
            assert!(improvement.subject_name != "Sport");
        }
        // One 10 on a single 9 reaches 9.5; two 9s need two 10s.
        assert_eq!(plan.improvements[0].subject_name, "Maths");
        assert_eq!(
            plan.improvements[0].easiest(),
            Some(&GradeSuggestion { count: 1, grade: 10 })
        );
        assert_eq!(
            plan.improvements[1].easiest(),
            Some(&GradeSuggestion { count: 2, grade: 10 })
        );
    }

    #[test]
    fn met_target_gives_empty_plan() {
        let subjects = vec![subject("Maths", &[9]), subject("English", &[8])];
        let plan = Portfolio::new(&subjects).plan(8.5).unwrap();
        assert_eq!(plan, ImprovementPlan::default());
    }

    #[test]
    fn target_above_scale_is_unmet_not_error() {
        let subjects = vec![subject("Maths", &[9])];
        let plan = Portfolio::new(&subjects).plan(10.5).unwrap();
        assert!(plan.improvements.is_empty());
        assert!(!plan.is_fully_achievable());
    }

    #[test]
    fn invalid_overall_target_is_rejected() {
        let subjects = vec![subject("Maths", &[9])];
        let portfolio = Portfolio::new(&subjects);
        assert!(matches!(
            portfolio.plan(f64::NAN),
            Err(PlannerError::InvalidOverallTarget { .. })
        ));
        assert_eq!(
            portfolio.plan(0.5),
            Err(PlannerError::InvalidOverallTarget { value: 0.5 })
        );
    }

    #[test]
    fn highest_average_is_bumped_first() {
        let subjects = vec![
            subject("Geography", &[6]),
            subject("Maths", &[8]),
            subject("Latin", &[9]),
        ];
        let plan = Portfolio::new(&subjects).plan(8.0).unwrap();
        assert_eq!(plan.points_needed, 1);
        assert_eq!(plan.improvements.len(), 1);
        assert_eq!(plan.improvements[0].subject_name, "Latin");
    }

    #[test]
    fn second_pass_stacks_points_on_selected_subject() {
        let subjects = vec![subject("Maths", &[8])];
        let plan = Portfolio::new(&subjects).plan(10.0).unwrap();
        assert_eq!(plan.points_needed, 2);
        assert_eq!(plan.unmet_points, 0);
        let improvement = &plan.improvements[0];
        assert_eq!(improvement.point_increase, 2);
        assert_eq!(improvement.target_average, 10);
        assert_eq!(
            improvement.easiest(),
            Some(&GradeSuggestion { count: 3, grade: 10 })
        );
        assert_eq!(plan.total_increase(), 2);
    }

    #[test]
    fn unreachable_subject_stays_in_plan_and_ranks_last() {
        let nines = vec![9; 50];
        let subjects = vec![subject("Chemistry", &nines), subject("Art", &[8, 8])];
        let plan = Portfolio::new(&subjects).plan(9.5).unwrap();

        assert_eq!(plan.improvements.len(), 2);
        assert_eq!(plan.improvements[0].subject_name, "Art");
        assert_eq!(
            plan.improvements[0].easiest(),
            Some(&GradeSuggestion { count: 1, grade: 10 })
        );
        assert_eq!(plan.improvements[1].subject_name, "Chemistry");
        assert!(!plan.improvements[1].is_achievable());
        assert_eq!(plan.improvements[1].target_average, 10);
    }

    #[test]
    fn empty_subject_with_lower_default_is_achievable() {
        let subjects = vec![Subject::new("Drama", Vec::new())];
        let plan = Portfolio::with_options(&subjects, &[], 7).plan(8.0).unwrap();
        let improvement = &plan.improvements[0];
        assert_eq!(improvement.current_average, 7);
        assert_eq!(improvement.target_average, 8);
        assert!(improvement.is_achievable());
        assert_eq!(
            improvement.easiest(),
            Some(&GradeSuggestion { count: 1, grade: 8 })
        );
    }

    #[test]
    fn second_pass_follows_first_pass_order_and_stops_when_met() {
        let subjects = vec![subject("Maths", &[6]), subject("Physics", &[6])];
        let plan = Portfolio::new(&subjects).plan(9.0).unwrap();
        assert_eq!(plan.points_needed, 6);
        assert_eq!(plan.unmet_points, 0);

        let maths = plan.improvements.iter().find(|i| i.subject_name == "Maths").unwrap();
        let physics = plan.improvements.iter().find(|i| i.subject_name == "Physics").unwrap();
        assert_eq!((maths.target_average, maths.point_increase), (10, 4));
        assert_eq!((physics.target_average, physics.point_increase), (8, 2));
        // 6 -> 8 takes a single 9; 6 -> 10 takes seven 10s, so Physics ranks first.
        assert_eq!(plan.improvements[0].subject_name, "Physics");
    }

    #[test]
    fn second_pass_skips_subject_without_headroom() {
        let subjects = vec![subject("Latin", &[9]), subject("Maths", &[6])];
        let plan = Portfolio::new(&subjects).plan(9.5).unwrap();
        assert_eq!(plan.points_needed, 4);
        assert_eq!(plan.unmet_points, 0);

        let latin = plan.improvements.iter().find(|i| i.subject_name == "Latin").unwrap();
        let maths = plan.improvements.iter().find(|i| i.subject_name == "Maths").unwrap();
        assert_eq!((latin.target_average, latin.point_increase), (10, 1));
        assert_eq!((maths.target_average, maths.point_increase), (9, 3));
        assert_eq!(plan.total_increase(), 4);
    }

    #[test]
    fn overridden_average_resolves_against_real_grades() {
        let subjects = vec![subject("Maths", &[6])];
        let mut portfolio = Portfolio::new(&subjects);
        portfolio.set_simulated_average_by_name("maths", 8).unwrap();
        let plan = portfolio.plan(9.0).unwrap();
        let improvement = &plan.improvements[0];
        assert_eq!(improvement.current_average, 8);
        assert_eq!(improvement.target_average, 9);
        // 6 + 10 = 8 (exactly); 6 + 10 + 10 = 8.67 -> 9.
        assert_eq!(
            improvement.easiest(),
            Some(&GradeSuggestion { count: 2, grade: 10 })
        );
    }

    #[test]
    fn planning_is_repeatable() {
        let subjects = vec![
            subject("Maths", &[7, 8]),
            subject("English", &[6]),
            subject("Physics", &[9, 8, 9]),
        ];
        let portfolio = Portfolio::new(&subjects);
        assert_eq!(portfolio.plan(9.0), portfolio.plan(9.0));
    }

    #[test]
    fn hidden_subjects_are_left_out() {
        let subjects = vec![subject("Maths", &[6]), subject("Sport", &[10])];
        let portfolio = Portfolio::with_options(&subjects, &["sport".to_string()], 10);
        assert_eq!(portfolio.simulations().len(), 1);
        assert_eq!(portfolio.overall_average(), Some(6.0));
    }

    #[test]
    fn overrides_can_be_counted_and_reset() {
        let subjects = vec![subject("Maths", &[6]), subject("English", &[8])];
        let mut portfolio = Portfolio::new(&subjects);
        assert_eq!(portfolio.overall_average(), Some(7.0));

        let english = subjects[1].id;
        portfolio.set_simulated_average(english, 10).unwrap();
        assert_eq!(portfolio.simulated_count(), 1);
        assert_eq!(portfolio.overall_average(), Some(8.0));
        assert!(matches!(
            portfolio.set_simulated_average_by_name("Latin", 9),
            Err(PlannerError::UnknownSubject { .. })
        ));

        portfolio.reset_simulations();
        assert_eq!(portfolio.simulated_count(), 0);
        assert_eq!(portfolio.overall_average(), Some(7.0));
    }

    #[test]
    fn points_needed_ignores_float_noise() {
        let subjects: Vec<Subject> = (0..10).map(|i| subject(&format!("S{i}"), &[9])).collect();
        let portfolio = Portfolio::new(&subjects);
        assert_eq!(portfolio.points_needed(9.1), 1);
        assert_eq!(portfolio.points_needed(9.0), 0);
    }

    #[test]
    fn empty_portfolio_has_nothing_to_plan() {
        let portfolio = Portfolio::new(&[]);
        assert!(portfolio.is_empty());
        assert_eq!(portfolio.overall_average(), None);
        assert_eq!(portfolio.plan(9.0).unwrap(), ImprovementPlan::default());
    }
}
