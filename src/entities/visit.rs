// Visit - one dated clinical encounter

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ClinicError, ClinicResult};

/// On-disk date rendering. Every save normalizes to this.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted source formats, tried in order.
const SOURCE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a visit date from row data, accepting `YYYY-MM-DD` and
/// `MM/DD/YYYY`. Anything else is a hard error.
pub fn parse_visit_date(raw: &str) -> ClinicResult<NaiveDate> {
    for format in SOURCE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    Err(ClinicError::MalformedDate(raw.to_string()))
}

/// Parse a caller-supplied query date. Only `YYYY-MM-DD` is accepted
/// at this boundary; the lenient two-format parse is for loading rows
/// written by older tooling.
pub fn parse_iso_date(raw: &str) -> ClinicResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ClinicError::MalformedDate(raw.to_string()))
}

/// One clinical encounter belonging to a patient.
///
/// Immutable once constructed; corrections go through the owning
/// department rewriting the patient's visit list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Unique within the owning patient's visit list only.
    pub visit_id: String,
    pub visit_time: NaiveDate,
    pub visit_department: String,
    pub chief_complaint: String,
    pub note_id: String,
    pub note_type: String,
}

impl Visit {
    /// Build a visit from raw field values, parsing the date.
    pub fn new(
        visit_id: String,
        visit_time: &str,
        visit_department: String,
        chief_complaint: String,
        note_id: String,
        note_type: String,
    ) -> ClinicResult<Self> {
        Ok(Visit {
            visit_id,
            visit_time: parse_visit_date(visit_time)?,
            visit_department,
            chief_complaint,
            note_id,
            note_type,
        })
    }

    /// Build a visit from an already-parsed date.
    pub fn from_date(
        visit_id: String,
        visit_time: NaiveDate,
        visit_department: String,
        chief_complaint: String,
        note_id: String,
        note_type: String,
    ) -> Self {
        Visit {
            visit_id,
            visit_time,
            visit_department,
            chief_complaint,
            note_id,
            note_type,
        }
    }
}
