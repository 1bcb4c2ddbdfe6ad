// Note + NotesRegistry - clinical notes keyed to (patient, visit)

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::department::Department;
use crate::entities::visit::parse_iso_date;
use crate::error::{ClinicError, ClinicResult};

/// Free-text clinical note tied to one patient visit.
///
/// Loaded once from the notes dataset and never mutated or persisted
/// by this layer. The struct doubles as the flat-row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "Patient_ID")]
    pub patient_id: String,
    #[serde(rename = "Visit_ID")]
    pub visit_id: String,
    #[serde(rename = "Note_ID")]
    pub note_id: String,
    #[serde(rename = "Note_text")]
    pub note_text: String,
}

/// The flat collection of notes, in file order.
///
/// Queries are linear scans; the dataset is small enough that no
/// secondary index is kept.
#[derive(Debug)]
pub struct NotesRegistry {
    notes: Vec<Note>,
}

impl NotesRegistry {
    /// Load the notes dataset. Unlike the patient file, a missing notes
    /// file is fatal: the registry is unusable without it.
    pub fn load(path: &Path) -> ClinicResult<Self> {
        if !path.exists() {
            return Err(ClinicError::NotesFileMissing(path.to_path_buf()));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let mut notes = Vec::new();
        for result in reader.deserialize() {
            let note: Note = result?;
            notes.push(note);
        }

        info!(count = notes.len(), "loaded notes dataset");
        Ok(NotesRegistry { notes })
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Every note attached to one of `patient_id`'s visits on
    /// `visit_date` (`YYYY-MM-DD`).
    ///
    /// This is a join across two independently loaded datasets with no
    /// referential-integrity enforcement: a note pointing at a visit
    /// that no longer exists is simply never returned, and a visit
    /// without notes yields an empty result rather than an error.
    pub fn notes_for(
        &self,
        patient_id: &str,
        visit_date: &str,
        department: &Department,
    ) -> ClinicResult<Vec<&Note>> {
        let date = parse_iso_date(visit_date)?;
        let patient = department
            .patient(patient_id)
            .ok_or_else(|| ClinicError::PatientNotFound(patient_id.to_string()))?;

        let mut found = Vec::new();
        for visit in patient.visits.iter().filter(|v| v.visit_time == date) {
            for note in &self.notes {
                if note.patient_id == patient_id && note.visit_id == visit.visit_id {
                    found.push(note);
                }
            }
        }
        Ok(found)
    }
}
