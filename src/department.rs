//! Patient registry backed by a flat per-visit file.
//!
//! The on-disk format is denormalized: one row per visit, with the
//! owning patient's demographics duplicated on every row. Loading folds
//! the rows back into the patient -> visits hierarchy keyed by patient
//! id. The file is always fully authoritative: every mutation
//! re-serializes the entire in-memory state, never a partial write.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entities::patient::{Demographics, Patient};
use crate::entities::visit::{parse_iso_date, Visit, DATE_FORMAT};
use crate::error::{ClinicError, ClinicResult};
use crate::ids::{visit_sequence_id, IdSource, RandomIds};

// ============================================================================
// FILE FORMAT
// ============================================================================

/// Column order of the patient/visit file. Fixed; the header row is
/// written even when the registry is empty.
const COLUMNS: [&str; 13] = [
    "Patient_ID",
    "Visit_ID",
    "Visit_time",
    "Visit_department",
    "Race",
    "Gender",
    "Ethnicity",
    "Age",
    "Zip_code",
    "Insurance",
    "Chief_complaint",
    "Note_ID",
    "Note_type",
];

/// One flat row of the patient/visit file. Field order matches
/// `COLUMNS`; the trailing three columns may be absent in older files.
#[derive(Debug, Deserialize, Serialize)]
struct VisitRow {
    #[serde(rename = "Patient_ID")]
    patient_id: String,
    #[serde(rename = "Visit_ID")]
    visit_id: String,
    #[serde(rename = "Visit_time")]
    visit_time: String,
    #[serde(rename = "Visit_department")]
    visit_department: String,
    #[serde(rename = "Race")]
    race: String,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Ethnicity")]
    ethnicity: String,
    #[serde(rename = "Age")]
    age: String,
    #[serde(rename = "Zip_code")]
    zip_code: String,
    #[serde(rename = "Insurance")]
    insurance: String,
    #[serde(rename = "Chief_complaint", default)]
    chief_complaint: String,
    #[serde(rename = "Note_ID", default)]
    note_id: String,
    #[serde(rename = "Note_type", default)]
    note_type: String,
}

impl VisitRow {
    fn from_visit(patient: &Patient, visit: &Visit) -> Self {
        VisitRow {
            patient_id: patient.patient_id.clone(),
            visit_id: visit.visit_id.clone(),
            visit_time: visit.visit_time.format(DATE_FORMAT).to_string(),
            visit_department: visit.visit_department.clone(),
            race: patient.race.clone(),
            gender: patient.gender.clone(),
            ethnicity: patient.ethnicity.clone(),
            age: patient.age.to_string(),
            zip_code: patient.zip_code.clone(),
            insurance: patient.insurance.clone(),
            chief_complaint: visit.chief_complaint.clone(),
            note_id: visit.note_id.clone(),
            note_type: visit.note_type.clone(),
        }
    }
}

// ============================================================================
// MUTATION INPUT
// ============================================================================

/// Field values for a visit being recorded through the mutation path.
///
/// Demographic fields left `None` fall back to the registry sentinels;
/// ids left `None` are generated.
#[derive(Debug, Clone, Default)]
pub struct VisitDraft {
    pub visit_time: String,
    pub visit_department: String,
    pub chief_complaint: String,
    pub visit_id: Option<String>,
    pub note_id: Option<String>,
    pub note_type: Option<String>,
    pub gender: Option<String>,
    pub race: Option<String>,
    pub age: Option<u32>,
    pub ethnicity: Option<String>,
    pub insurance: Option<String>,
    pub zip_code: Option<String>,
}

impl VisitDraft {
    fn demographics(&self) -> Demographics {
        Demographics {
            gender: unknown(&self.gender),
            race: unknown(&self.race),
            age: self.age.unwrap_or(0),
            ethnicity: unknown(&self.ethnicity),
            insurance: unknown(&self.insurance),
            zip_code: self
                .zip_code
                .clone()
                .unwrap_or_else(|| "00000".to_string()),
        }
    }
}

fn unknown(field: &Option<String>) -> String {
    field.clone().unwrap_or_else(|| "Unknown".to_string())
}

// ============================================================================
// DEPARTMENT REGISTRY
// ============================================================================

/// The patient registry: owns every patient, loads them from and saves
/// them back to one flat file.
#[derive(Debug)]
pub struct Department {
    name: String,
    file_path: PathBuf,
    patients: BTreeMap<String, Patient>,
    ids: Box<dyn IdSource>,
}

impl Department {
    /// Open the registry, folding the flat file into the hierarchy.
    ///
    /// A missing file means an empty registry, not an error. A row
    /// whose visit date parses in neither accepted format aborts the
    /// whole load; a skipped row would silently vanish on the next
    /// save.
    pub fn load(name: impl Into<String>, file_path: impl Into<PathBuf>) -> ClinicResult<Self> {
        let mut department = Department {
            name: name.into(),
            file_path: file_path.into(),
            patients: BTreeMap::new(),
            ids: Box::new(RandomIds),
        };

        if !department.file_path.exists() {
            info!(
                path = %department.file_path.display(),
                "patient file not found, starting with empty registry"
            );
            return Ok(department);
        }

        let mut reader = csv::Reader::from_path(&department.file_path)?;
        let mut rows = 0usize;
        for result in reader.deserialize() {
            let row: VisitRow = result?;
            department.fold_row(row)?;
            rows += 1;
        }

        info!(
            rows,
            patients = department.patients.len(),
            department = %department.name,
            "loaded patient registry"
        );
        Ok(department)
    }

    /// Swap the note-id source. Tests use a deterministic sequence.
    pub fn with_id_source(mut self, ids: Box<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    fn fold_row(&mut self, row: VisitRow) -> ClinicResult<()> {
        let VisitRow {
            patient_id,
            visit_id,
            visit_time,
            visit_department,
            race,
            gender,
            ethnicity,
            age,
            zip_code,
            insurance,
            chief_complaint,
            note_id,
            note_type,
        } = row;

        let visit = Visit::new(
            visit_id,
            &visit_time,
            visit_department,
            chief_complaint,
            note_id,
            note_type,
        )?;

        // Unparsable ages coerce to 0; this leniency is part of the
        // file format's contract, unlike dates.
        let age = age.trim().parse().unwrap_or(0);

        // The first row seen for a patient id wins its demographics.
        // Later rows only contribute their visit.
        let patient = self
            .patients
            .entry(patient_id.clone())
            .or_insert_with(|| {
                Patient::new(
                    patient_id,
                    Demographics {
                        gender,
                        race,
                        age,
                        ethnicity,
                        insurance,
                        zip_code,
                    },
                )
            });
        patient.add_visit(visit);
        Ok(())
    }

    /// Serialize the whole registry back to the flat file.
    ///
    /// Rows are ordered by patient id, then by each patient's visit
    /// order, so repeated saves of the same state are byte-identical.
    /// The buffer is built fully in memory and written in one call; a
    /// failed save leaves the previous file intact.
    pub fn save(&self) -> ClinicResult<()> {
        let buffer = rows_to_buffer(
            self.patients
                .values()
                .flat_map(|patient| {
                    patient
                        .visits
                        .iter()
                        .map(move |visit| VisitRow::from_visit(patient, visit))
                }),
        )?;
        fs::write(&self.file_path, buffer)?;
        debug!(path = %self.file_path.display(), "saved patient registry");
        Ok(())
    }

    /// Record a visit, creating or refreshing the patient record.
    ///
    /// Demographics supplied here replace whatever the registry holds.
    /// That is deliberately different from load, where the first row
    /// for a patient wins. Returns the id of the recorded visit.
    ///
    /// The visit date must be `YYYY-MM-DD`; a malformed date mutates
    /// nothing. A failed persist rolls the in-memory change back.
    pub fn add_or_update_visit(
        &mut self,
        patient_id: &str,
        draft: VisitDraft,
    ) -> ClinicResult<String> {
        let visit_time = parse_iso_date(&draft.visit_time)?;
        let demographics = draft.demographics();
        let previous = self.patients.get(patient_id).cloned();

        let note_id = match draft.note_id {
            Some(id) => id,
            None => self.ids.next_note_id(),
        };

        let patient = match self.patients.entry(patient_id.to_string()) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                existing.set_demographics(demographics);
                existing
            }
            Entry::Vacant(entry) => entry.insert(Patient::new(patient_id, demographics)),
        };

        let visit_id = match draft.visit_id {
            Some(id) => id,
            None => visit_sequence_id(patient.visits.len()),
        };

        patient.add_visit(Visit::from_date(
            visit_id.clone(),
            visit_time,
            draft.visit_department,
            draft.chief_complaint,
            note_id,
            draft.note_type.unwrap_or_else(|| "Unspecified".to_string()),
        ));

        if let Err(err) = self.save() {
            // Persist failed: put the registry back the way it was.
            match previous {
                Some(patient) => {
                    self.patients.insert(patient_id.to_string(), patient);
                }
                None => {
                    self.patients.remove(patient_id);
                }
            }
            return Err(err);
        }

        info!(patient_id, visit_id = %visit_id, "recorded visit");
        Ok(visit_id)
    }

    /// Drop a patient and every visit they own, then persist.
    pub fn remove_patient(&mut self, patient_id: &str) -> ClinicResult<()> {
        let removed = self
            .patients
            .remove(patient_id)
            .ok_or_else(|| ClinicError::PatientNotFound(patient_id.to_string()))?;

        if let Err(err) = self.save() {
            self.patients.insert(patient_id.to_string(), removed);
            return Err(err);
        }

        info!(patient_id, "removed patient");
        Ok(())
    }

    /// Count visits falling on one calendar date (`YYYY-MM-DD`).
    ///
    /// A malformed date is reported as such, never as a zero count.
    pub fn count_visits_on(&self, date: &str) -> ClinicResult<usize> {
        let date = parse_iso_date(date)?;
        Ok(self
            .patients
            .values()
            .flat_map(|patient| patient.visits.iter())
            .filter(|visit| visit.visit_time == date)
            .count())
    }

    /// Demographics plus the most recent visit for a patient.
    ///
    /// Ties on the date resolve to the later entry in the visit list.
    pub fn retrieve_latest_visit(&self, patient_id: &str) -> ClinicResult<(&Patient, &Visit)> {
        let patient = self
            .patient(patient_id)
            .ok_or_else(|| ClinicError::PatientNotFound(patient_id.to_string()))?;
        let visit = patient
            .latest_visit()
            .ok_or_else(|| ClinicError::NoVisits(patient_id.to_string()))?;
        Ok((patient, visit))
    }

    /// Write one patient's visit history as its own flat file, in the
    /// same column shape as the registry file.
    pub fn export_patient(&self, patient_id: &str, output: &Path) -> ClinicResult<()> {
        let patient = self
            .patient(patient_id)
            .ok_or_else(|| ClinicError::PatientNotFound(patient_id.to_string()))?;

        let buffer = rows_to_buffer(
            patient
                .visits
                .iter()
                .map(|visit| VisitRow::from_visit(patient, visit)),
        )?;
        fs::write(output, buffer)?;
        info!(patient_id, path = %output.display(), "exported patient history");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn patient(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.get(patient_id)
    }

    /// Patients in save order (sorted by patient id).
    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.patients.values()
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    pub fn visit_count(&self) -> usize {
        self.patients.values().map(|p| p.visits.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

/// Serialize rows behind a manually written header so even an empty
/// registry produces a header-only file.
fn rows_to_buffer(rows: impl Iterator<Item = VisitRow>) -> ClinicResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|err| ClinicError::Io(err.into_error()))
}
