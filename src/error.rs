use std::path::PathBuf;

/// Failure taxonomy for the record keeper.
///
/// Malformed dates and missing records are expected-input outcomes the
/// caller renders; the I/O variants mean the backing files themselves
/// could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid date `{0}`: expected YYYY-MM-DD or MM/DD/YYYY")]
    MalformedDate(String),
    #[error("patient `{0}` not found")]
    PatientNotFound(String),
    #[error("patient `{0}` has no recorded visits")]
    NoVisits(String),
    #[error("no patient records available")]
    EmptyRegistry,
    #[error("notes file not found: {}", .0.display())]
    NotesFileMissing(PathBuf),
    #[error("record file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record file: {0}")]
    Csv(#[from] csv::Error),
}

impl ClinicError {
    /// True for lookup misses, as opposed to bad input or I/O faults.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ClinicError::PatientNotFound(_) | ClinicError::NoVisits(_)
        )
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
