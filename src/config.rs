//! Startup-resolved configuration.
//!
//! File locations are read once when the process starts and passed into
//! the services, so nothing consults environment variables while an
//! operation is in flight.

use std::env;
use std::path::{Path, PathBuf};

/// Locations of the four flat files the clinic operates on.
#[derive(Clone, Debug)]
pub struct Config {
    data_file: PathBuf,
    notes_file: PathBuf,
    credentials_file: PathBuf,
    usage_log: PathBuf,
}

impl Config {
    /// Resolve from the environment, falling back to the conventional
    /// file names in the working directory.
    pub fn from_env() -> Self {
        Config {
            data_file: env_path("CLINIC_DATA_FILE", "Patient_data.csv"),
            notes_file: env_path("CLINIC_NOTES_FILE", "Notes.csv"),
            credentials_file: env_path("CLINIC_CREDENTIALS_FILE", "Credentials.csv"),
            usage_log: env_path("CLINIC_USAGE_LOG", "usage_log.csv"),
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn notes_file(&self) -> &Path {
        &self.notes_file
    }

    pub fn credentials_file(&self) -> &Path {
        &self.credentials_file
    }

    pub fn usage_log(&self) -> &Path {
        &self.usage_log
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
