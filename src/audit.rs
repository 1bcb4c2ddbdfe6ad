//! Append-only usage log.
//!
//! One row per action, appended as it happens. The log is write-only
//! from this layer's point of view; nothing here reads it back.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::ClinicResult;

pub struct UsageLog {
    path: PathBuf,
}

impl UsageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UsageLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event, writing the header first when the file does
    /// not exist yet.
    pub fn record(&self, username: &str, role: &str, action: &str) -> ClinicResult<()> {
        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::Writer::from_writer(file);

        if is_new {
            writer.write_record(["Timestamp", "Username", "Role", "Action"])?;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        writer.write_record([timestamp.as_str(), username, role, action])?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_header_written_exactly_once() {
        let dir = TempDir::new().unwrap();
        let log = UsageLog::new(dir.path().join("usage_log.csv"));

        log.record("carla", "clinician", "Login Success").unwrap();
        log.record("carla", "clinician", "Counted visits on 2024-01-10")
            .unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Timestamp,Username,Role,Action");
        assert!(lines[1].ends_with("carla,clinician,Login Success"));
        assert!(lines[2].contains("Counted visits on 2024-01-10"));
    }

    #[test]
    fn test_rows_are_appended_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("usage_log.csv");

        UsageLog::new(&path)
            .record("ned", "nurse", "Login Success")
            .unwrap();
        UsageLog::new(&path)
            .record("ana", "admin", "Login Success")
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3, "one header plus two events");
    }
}
