// Patient - demographics plus ordered visit history

use serde::{Deserialize, Serialize};

use super::visit::Visit;

/// The demographic fields carried on every flat row.
///
/// All free-form; age is the only field that gets numeric coercion,
/// and that happens at the row boundary (bad input becomes 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub gender: String,
    pub race: String,
    pub age: u32,
    pub ethnicity: String,
    pub insurance: String,
    pub zip_code: String,
}

/// Aggregate root: a demographic record plus its visit history.
///
/// Visit order is insertion order, the order rows were encountered on
/// load or appended by mutation. It is not required to be chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub gender: String,
    pub race: String,
    pub age: u32,
    pub ethnicity: String,
    pub insurance: String,
    pub zip_code: String,
    pub visits: Vec<Visit>,
}

impl Patient {
    pub fn new(patient_id: impl Into<String>, demographics: Demographics) -> Self {
        Patient {
            patient_id: patient_id.into(),
            gender: demographics.gender,
            race: demographics.race,
            age: demographics.age,
            ethnicity: demographics.ethnicity,
            insurance: demographics.insurance,
            zip_code: demographics.zip_code,
            visits: Vec::new(),
        }
    }

    pub fn add_visit(&mut self, visit: Visit) {
        self.visits.push(visit);
    }

    /// Replace every demographic field with the supplied set.
    pub fn set_demographics(&mut self, demographics: Demographics) {
        self.gender = demographics.gender;
        self.race = demographics.race;
        self.age = demographics.age;
        self.ethnicity = demographics.ethnicity;
        self.insurance = demographics.insurance;
        self.zip_code = demographics.zip_code;
    }

    /// The visit with the latest date. Ties resolve to the later entry
    /// in the list, so repeated lookups return the same visit.
    pub fn latest_visit(&self) -> Option<&Visit> {
        self.visits
            .iter()
            .enumerate()
            .max_by_key(|(index, visit)| (visit.visit_time, *index))
            .map(|(_, visit)| visit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn visit(id: &str, date: (i32, u32, u32)) -> Visit {
        Visit::from_date(
            id.to_string(),
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            "General".to_string(),
            String::new(),
            String::new(),
            String::new(),
        )
    }

    #[test]
    fn test_latest_visit_picks_max_date() {
        let mut patient = Patient::new("P1", Demographics::default());
        patient.add_visit(visit("V001", (2024, 3, 1)));
        patient.add_visit(visit("V002", (2024, 1, 15)));
        patient.add_visit(visit("V003", (2024, 2, 20)));

        assert_eq!(patient.latest_visit().unwrap().visit_id, "V001");
    }

    #[test]
    fn test_latest_visit_tie_resolves_to_later_entry() {
        let mut patient = Patient::new("P1", Demographics::default());
        patient.add_visit(visit("V001", (2024, 3, 1)));
        patient.add_visit(visit("V002", (2024, 3, 1)));

        assert_eq!(patient.latest_visit().unwrap().visit_id, "V002");
    }

    #[test]
    fn test_latest_visit_empty_is_none() {
        let patient = Patient::new("P1", Demographics::default());
        assert!(patient.latest_visit().is_none());
    }

    #[test]
    fn test_set_demographics_replaces_every_field() {
        let mut patient = Patient::new(
            "P1",
            Demographics {
                gender: "F".to_string(),
                age: 40,
                ..Demographics::default()
            },
        );
        patient.set_demographics(Demographics {
            gender: "M".to_string(),
            race: "Asian".to_string(),
            age: 41,
            ethnicity: "Non-Hispanic".to_string(),
            insurance: "Medicare".to_string(),
            zip_code: "02139".to_string(),
        });

        assert_eq!(patient.gender, "M");
        assert_eq!(patient.age, 41);
        assert_eq!(patient.insurance, "Medicare");
    }
}
