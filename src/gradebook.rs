use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::{Grade, GradeRecord, Subject};

#[derive(Debug, Serialize, Deserialize)]
struct GradeRow {
    subject: String,
    grade: i64,
    recorded_on: Option<NaiveDate>,
    #[serde(default)]
    note: Option<String>,
}

/// Reads a `subject,grade,recorded_on[,note]` CSV into subjects.
///
/// Subjects keep the order in which they first appear. Any grade off the
/// 1-10 scale fails the whole load with the offending line.
pub fn load_subjects(csv_path: &Path) -> Result<Vec<Subject>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("opening {}", csv_path.display()))?;
    let mut subjects: Vec<Subject> = Vec::new();

    for (index, result) in reader.deserialize::<GradeRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("reading line {line}"))?;
        let grade =
            Grade::new(row.grade).with_context(|| format!("line {line} ({})", row.subject))?;
        let record = GradeRecord {
            grade,
            recorded_on: row.recorded_on,
            note: row.note.filter(|note| !note.is_empty()),
        };

        match subjects
            .iter_mut()
            .find(|subject| subject.name.eq_ignore_ascii_case(&row.subject))
        {
            Some(subject) => subject.grades.push(record),
            None => subjects.push(Subject::new(row.subject, vec![record])),
        }
    }

    debug!(
        "loaded {} subjects from {}",
        subjects.len(),
        csv_path.display()
    );
    Ok(subjects)
}

/// Writes a realistic term of grades for trying the planner out.
pub fn write_sample(csv_path: &Path) -> Result<usize> {
    let rows = vec![
        ("Mathematics", 7, (2026, 9, 18), "Algebra test"),
        ("Mathematics", 8, (2026, 10, 2), "Homework check"),
        ("Mathematics", 6, (2026, 10, 14), "Geometry quiz"),
        ("Romanian", 9, (2026, 9, 22), "Essay"),
        ("Romanian", 9, (2026, 10, 9), "Oral exam"),
        ("English", 10, (2026, 9, 25), "Listening"),
        ("English", 9, (2026, 10, 6), "Vocabulary"),
        ("Physics", 6, (2026, 9, 29), "Kinematics"),
        ("Physics", 7, (2026, 10, 13), "Lab report"),
        ("Chemistry", 8, (2026, 10, 1), "Periodic table"),
        ("History", 9, (2026, 9, 20), "Project"),
        ("History", 10, (2026, 10, 8), "Presentation"),
        ("Sport", 10, (2026, 10, 3), "Relay"),
    ];

    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("creating {}", csv_path.display()))?;
    for (subject, grade, (year, month, day), note) in &rows {
        writer.serialize(GradeRow {
            subject: subject.to_string(),
            grade: *grade,
            recorded_on: Some(
                NaiveDate::from_ymd_opt(*year, *month, *day).context("invalid date")?,
            ),
            note: Some(note.to_string()),
        })?;
    }
    writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_rows_by_subject_in_first_seen_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grades.csv");
        std::fs::write(
            &path,
            "subject,grade,recorded_on,note\n\
             Maths,7,2026-09-18,test\n\
             Physics,6,2026-09-20,\n\
             maths, 9 ,2026-10-01,oral\n",
        )
        .unwrap();

        let subjects = load_subjects(&path).unwrap();
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].name, "Maths");
        assert_eq!(subjects[0].grades.len(), 2);
        assert_eq!(subjects[0].natural_average(), 8);
        assert_eq!(subjects[1].grades[0].note, None);
        assert_ne!(subjects[0].id, subjects[1].id);
    }

    #[test]
    fn rejects_grade_off_the_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grades.csv");
        std::fs::write(&path, "subject,grade,recorded_on\nMaths,12,2026-09-18\n").unwrap();

        let err = load_subjects(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("grade 12 is outside the 1-10 scale"));
    }

    #[test]
    fn sample_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        let written = write_sample(&path).unwrap();

        let subjects = load_subjects(&path).unwrap();
        let total: usize = subjects.iter().map(|s| s.grades.len()).sum();
        assert_eq!(total, written);
        assert_eq!(subjects.len(), 7);
        assert_eq!(subjects[0].name, "Mathematics");
    }
}
