use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use log::{info, warn};

use grade_planner::config::PlannerConfig;
use grade_planner::{gradebook, report, Grade, Portfolio, Subject, SubjectSimulation};

#[derive(Parser)]
#[command(name = "grade-planner")]
#[command(about = "Grade average simulator and improvement planner", long_about = None)]
struct Cli {
    /// Planner settings (TOML); falls back to $GRADE_PLANNER_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample grades CSV
    Seed {
        #[arg(long, default_value = "grades.csv")]
        out: PathBuf,
    },
    /// Show every subject average and the overall average
    Averages {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Suggest grades that lift one subject to a target average
    Suggest {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        subject: String,
        /// Target average (defaults to the configured subject target)
        #[arg(long)]
        target: Option<i64>,
        /// Hypothetical grade to add before suggesting; repeatable
        #[arg(long = "add")]
        add: Vec<i64>,
    },
    /// Plan which subjects to raise for an overall average
    Plan {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        target: Option<f64>,
        /// Override a subject average, as NAME=AVG; repeatable
        #[arg(long = "set", value_parser = parse_override)]
        overrides: Vec<(String, i64)>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn parse_override(raw: &str) -> Result<(String, i64), String> {
    let (name, average) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=AVG, got '{raw}'"))?;
    let average = average
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("bad average in '{raw}': {err}"))?;
    Ok((name.trim().to_string(), average))
}

fn load(csv: &Path) -> anyhow::Result<Vec<Subject>> {
    let subjects = gradebook::load_subjects(csv)?;
    info!("{} subjects loaded from {}", subjects.len(), csv.display());
    Ok(subjects)
}

fn build_portfolio<'a>(subjects: &'a [Subject], config: &PlannerConfig) -> Portfolio<'a> {
    for hidden in &config.hidden_subjects {
        if !subjects
            .iter()
            .any(|subject| subject.name.eq_ignore_ascii_case(hidden))
        {
            warn!("hidden subject '{}' is not in the grade list", hidden);
        }
    }
    Portfolio::with_options(subjects, &config.hidden_subjects, config.default_average)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = PlannerConfig::load(cli.config.as_deref()).context("loading planner config")?;

    match cli.command {
        Commands::Seed { out } => {
            let written = gradebook::write_sample(&out)?;
            println!("Wrote {written} sample grades to {}.", out.display());
        }
        Commands::Averages { csv } => {
            let subjects = load(&csv)?;
            let portfolio = build_portfolio(&subjects, &config);

            if portfolio.is_empty() {
                println!("No subjects found.");
                return Ok(());
            }

            println!("Subject averages:");
            for simulation in portfolio.simulations() {
                let subject = simulation.subject();
                println!(
                    "- {} {} ({} grades)",
                    subject.name,
                    simulation.simulated_average(),
                    subject.grades.len()
                );
            }
            if let Some(overall) = portfolio.overall_average() {
                println!("Overall average {:.2}", overall);
            }
        }
        Commands::Suggest {
            csv,
            subject,
            target,
            add,
        } => {
            let subjects = load(&csv)?;
            let found = subjects
                .iter()
                .find(|candidate| candidate.name.eq_ignore_ascii_case(&subject))
                .ok_or_else(|| anyhow!("no subject named '{subject}' in {}", csv.display()))?;

            let mut simulation = SubjectSimulation::with_default(found, config.default_average);
            for value in add {
                simulation.add_simulated_grade(Grade::new(value)?);
            }
            let target = target.unwrap_or_else(|| config.subject_target(&found.name) as i64);
            simulation.set_target_average(Some(target))?;

            println!(
                "{}: average {} (real {}), target {}",
                found.name,
                simulation.average(),
                found.natural_average_or(config.default_average),
                target
            );
            let suggestions = simulation.suggestions();
            if simulation.average() as i64 >= target {
                println!("Target already met.");
            } else if suggestions.is_empty() {
                println!("Not achievable with up to 10 more grades.");
            } else {
                println!("Ways to get there, easiest first:");
                for suggestion in &suggestions {
                    println!("- add {}", suggestion);
                }
            }
        }
        Commands::Plan {
            csv,
            target,
            overrides,
            limit,
            json,
        } => {
            let subjects = load(&csv)?;
            let mut portfolio = build_portfolio(&subjects, &config);
            for (name, average) in &overrides {
                portfolio.set_simulated_average_by_name(name, *average)?;
            }
            let target = target.unwrap_or(config.overall_target);
            let plan = portfolio.plan(target)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }

            if let Some(overall) = portfolio.overall_average() {
                println!("Overall average {:.2}, target {:.2}.", overall, target);
            }
            if plan.improvements.is_empty() && plan.is_fully_achievable() {
                println!("Target already met.");
                return Ok(());
            }

            println!("Improvement plan ({} points needed):", plan.points_needed);
            for improvement in plan.improvements.iter().take(limit) {
                println!("- {}", report::describe_improvement(improvement));
            }
            if !plan.is_fully_achievable() {
                println!(
                    "Only partially achievable: {} of {} points left unplanned.",
                    plan.unmet_points, plan.points_needed
                );
            }
        }
        Commands::Report { csv, target, out } => {
            let subjects = load(&csv)?;
            let portfolio = build_portfolio(&subjects, &config);
            let target = target.unwrap_or(config.overall_target);
            let plan = portfolio.plan(target)?;
            let report = report::build_report(&subjects, &portfolio, &plan, target);
            std::fs::write(&out, report)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
