//! Aggregate summaries over a department's visit rows.
//!
//! Everything here is read-only over the registry. `generate` builds
//! the in-memory report; `export` writes the two-section summary file;
//! `render` formats the full report for console display.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::department::Department;
use crate::error::{ClinicError, ClinicResult};

/// Age bucket boundaries, half-open on the right: `[lo, hi)`. An age
/// outside the final bucket is dropped from the age breakdown only.
const AGE_BUCKETS: [(u32, u32, &str); 6] = [
    (0, 18, "0-18"),
    (18, 35, "19-35"),
    (35, 50, "36-50"),
    (50, 65, "51-65"),
    (65, 80, "66-80"),
    (80, 100, "81-100"),
];

/// Aggregate counts over the flattened visit rows (demographics are
/// counted once per visit, not once per patient).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    /// Visit counts keyed `YYYY-MM`, ascending.
    pub monthly_visits: Vec<(String, usize)>,
    /// Counts per insurance value, first-seen order.
    pub insurance: Vec<(String, usize)>,
    /// Counts per gender, most common first.
    pub gender: Vec<(String, usize)>,
    /// Counts per race, most common first.
    pub race: Vec<(String, usize)>,
    /// Counts per age bucket, in bucket order. Every bucket is listed,
    /// including empty ones.
    pub age_groups: Vec<(String, usize)>,
}

/// Build the full report. Pure function over the registry.
pub fn generate(department: &Department) -> StatisticsReport {
    let mut monthly: BTreeMap<String, usize> = BTreeMap::new();
    let mut insurance: Vec<(String, usize)> = Vec::new();
    let mut gender: Vec<(String, usize)> = Vec::new();
    let mut race: Vec<(String, usize)> = Vec::new();
    let mut ages = [0usize; AGE_BUCKETS.len()];

    for patient in department.patients() {
        for visit in &patient.visits {
            *monthly
                .entry(visit.visit_time.format("%Y-%m").to_string())
                .or_default() += 1;
            bump(&mut insurance, &patient.insurance);
            bump(&mut gender, &patient.gender);
            bump(&mut race, &patient.race);
            if let Some(bucket) = AGE_BUCKETS
                .iter()
                .position(|(lo, hi, _)| (*lo..*hi).contains(&patient.age))
            {
                ages[bucket] += 1;
            }
        }
    }

    sort_by_count(&mut gender);
    sort_by_count(&mut race);

    StatisticsReport {
        monthly_visits: monthly.into_iter().collect(),
        insurance,
        gender,
        race,
        age_groups: AGE_BUCKETS
            .iter()
            .zip(ages)
            .map(|((_, _, label), count)| (label.to_string(), count))
            .collect(),
    }
}

/// Write the exportable summary: monthly counts and insurance mix as
/// two titled sections separated by a blank row.
///
/// The buffer is built fully in memory and written once; a failed
/// export never leaves a partial file. An empty registry refuses to
/// export.
pub fn export(department: &Department, output: &Path) -> ClinicResult<()> {
    if department.is_empty() {
        return Err(ClinicError::EmptyRegistry);
    }

    let report = generate(department);

    // Two independently built sections joined by one blank row, all
    // assembled before anything touches the file.
    let mut buffer = section(
        "Monthly Visit Summary",
        ["Month", "Number of Visits"],
        &report.monthly_visits,
    )?;
    buffer.push(b'\n');
    buffer.extend(section(
        "Insurance Distribution",
        ["Insurance", "Count"],
        &report.insurance,
    )?);
    fs::write(output, buffer)?;

    info!(path = %output.display(), "exported statistics summary");
    Ok(())
}

/// Format the full report for console display.
pub fn render(report: &StatisticsReport) -> String {
    let mut out = String::new();

    out.push_str("Monthly Visit Trends:\n");
    for (month, count) in &report.monthly_visits {
        out.push_str(&format!("  - {}: {} visits\n", month, count));
    }

    out.push_str("\nVisits by Insurance Type:\n");
    for (name, count) in &report.insurance {
        out.push_str(&format!("  - {}: {} visits\n", name, count));
    }

    out.push_str("\nGender Distribution:\n");
    for (name, count) in &report.gender {
        out.push_str(&format!("  - {}: {}\n", name, count));
    }

    out.push_str("\nRace Distribution:\n");
    for (name, count) in &report.race {
        out.push_str(&format!("  - {}: {}\n", name, count));
    }

    out.push_str("\nAge Groups:\n");
    for (label, count) in &report.age_groups {
        out.push_str(&format!("  - {}: {}\n", label, count));
    }

    out
}

fn section(
    title: &str,
    header: [&str; 2],
    rows: &[(String, usize)],
) -> ClinicResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record([title])?;
    writer.write_record(header)?;
    for (label, count) in rows {
        writer.write_record([label.as_str(), &count.to_string()])?;
    }
    writer
        .into_inner()
        .map_err(|err| ClinicError::Io(err.into_error()))
}

fn bump(counts: &mut Vec<(String, usize)>, key: &str) {
    match counts.iter_mut().find(|(existing, _)| existing == key) {
        Some((_, count)) => *count += 1,
        None => counts.push((key.to_string(), 1)),
    }
}

/// Descending by count, name as the tiebreak, so the order is stable
/// across runs.
fn sort_by_count(counts: &mut [(String, usize)]) {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::department::VisitDraft;
    use std::fs;
    use tempfile::TempDir;

    fn department_with(rows: &[(&str, &str, &str, u32)]) -> (TempDir, Department) {
        // (patient_id, date, insurance, age)
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Patient_data.csv");
        let mut department = Department::load("General", path).unwrap();
        for (patient_id, date, insurance, age) in rows {
            department
                .add_or_update_visit(
                    patient_id,
                    VisitDraft {
                        visit_time: date.to_string(),
                        visit_department: "ER".to_string(),
                        insurance: Some(insurance.to_string()),
                        age: Some(*age),
                        ..VisitDraft::default()
                    },
                )
                .unwrap();
        }
        (dir, department)
    }

    #[test]
    fn test_monthly_counts_sorted_ascending() {
        let (_dir, department) = department_with(&[
            ("P1", "2024-01-05", "Medicaid", 30),
            ("P1", "2024-01-20", "Medicaid", 30),
            ("P2", "2024-02-01", "Medicare", 60),
        ]);
        let report = generate(&department);

        assert_eq!(
            report.monthly_visits,
            vec![
                ("2024-01".to_string(), 2),
                ("2024-02".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_insurance_counts_visits_not_patients() {
        let (_dir, department) = department_with(&[
            ("P1", "2024-01-05", "Medicaid", 30),
            ("P1", "2024-01-20", "Medicaid", 30),
            ("P2", "2024-02-01", "Medicare", 60),
        ]);
        let report = generate(&department);

        assert_eq!(
            report.insurance,
            vec![
                ("Medicaid".to_string(), 2),
                ("Medicare".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_age_bucket_boundaries_are_half_open() {
        let (_dir, department) = department_with(&[
            ("P1", "2024-01-05", "Medicaid", 18),
            ("P2", "2024-01-06", "Medicaid", 17),
            ("P3", "2024-01-07", "Medicaid", 100),
        ]);
        let report = generate(&department);

        let find = |label: &str| {
            report
                .age_groups
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, c)| *c)
                .unwrap()
        };
        assert_eq!(find("0-18"), 1, "17 belongs to [0,18)");
        assert_eq!(find("19-35"), 1, "18 belongs to [18,35)");
        let bucketed: usize = report.age_groups.iter().map(|(_, c)| c).sum();
        assert_eq!(bucketed, 2, "age 100 falls into no bucket");
    }

    #[test]
    fn test_export_refuses_empty_registry() {
        let dir = TempDir::new().unwrap();
        let department =
            Department::load("General", dir.path().join("Patient_data.csv")).unwrap();

        let err = export(&department, &dir.path().join("summary.csv")).unwrap_err();
        assert!(matches!(err, ClinicError::EmptyRegistry));
    }

    #[test]
    fn test_export_writes_two_titled_sections() {
        let (dir, department) = department_with(&[
            ("P1", "2024-01-05", "Medicaid", 30),
            ("P2", "2024-02-01", "Medicare", 60),
        ]);
        let output = dir.path().join("summary.csv");
        export(&department, &output).unwrap();

        let contents = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "Monthly Visit Summary");
        assert_eq!(lines[1], "Month,Number of Visits");
        assert_eq!(lines[2], "2024-01,1");
        assert_eq!(lines[3], "2024-02,1");
        assert_eq!(lines[4], "", "sections are separated by a blank row");
        assert_eq!(lines[5], "Insurance Distribution");
        assert_eq!(lines[6], "Insurance,Count");
    }

    #[test]
    fn test_gender_counts_sorted_most_common_first() {
        let (_dir, department) = department_with(&[
            ("P1", "2024-01-05", "Medicaid", 30),
            ("P2", "2024-01-06", "Medicaid", 30),
        ]);
        // Both patients were created through the mutation path with no
        // gender supplied, so every visit row counts as Unknown.
        let report = generate(&department);
        assert_eq!(report.gender, vec![("Unknown".to_string(), 2)]);
    }
}
