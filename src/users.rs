//! Credential file and role capabilities.
//!
//! The clinic gates every operation on a role read from a flat
//! `username,password,role` file. Which role may do what is fixed
//! policy, encoded here rather than scattered through the callers.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::ClinicResult;

/// Staff roles understood by the clinic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Clinician,
    Nurse,
    Admin,
    Management,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_lowercase().as_str() {
            "clinician" => Some(Role::Clinician),
            "nurse" => Some(Role::Nurse),
            "admin" => Some(Role::Admin),
            "management" => Some(Role::Management),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Clinician => "clinician",
            Role::Nurse => "nurse",
            Role::Admin => "admin",
            Role::Management => "management",
        }
    }

    pub fn can_add_patient(&self) -> bool {
        matches!(self, Role::Clinician | Role::Nurse)
    }

    pub fn can_remove_patient(&self) -> bool {
        matches!(self, Role::Clinician | Role::Nurse)
    }

    pub fn can_retrieve_patient(&self) -> bool {
        matches!(self, Role::Clinician | Role::Nurse)
    }

    pub fn can_view_note(&self) -> bool {
        matches!(self, Role::Clinician | Role::Nurse)
    }

    pub fn can_count_visits(&self) -> bool {
        matches!(self, Role::Clinician | Role::Nurse | Role::Admin)
    }

    pub fn can_generate_statistics(&self) -> bool {
        matches!(self, Role::Management)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// An authenticated session identity.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct CredentialRow {
    username: String,
    password: String,
    role: String,
}

/// Check a username/password pair against the credential file.
///
/// Returns `Ok(None)` when the pair matches no row. A missing
/// credential file denies every login rather than erroring; a row
/// carrying a role the clinic does not recognize also denies.
pub fn authenticate(
    credentials_file: &Path,
    username: &str,
    password: &str,
) -> ClinicResult<Option<User>> {
    if !credentials_file.exists() {
        warn!(path = %credentials_file.display(), "credentials file not found");
        return Ok(None);
    }

    let username = username.trim();
    let password = password.trim();

    let mut reader = csv::Reader::from_path(credentials_file)?;
    for result in reader.deserialize() {
        let row: CredentialRow = result?;
        if row.username.trim() == username && row.password.trim() == password {
            return match Role::parse(&row.role) {
                Some(role) => Ok(Some(User {
                    username: row.username.trim().to_string(),
                    role,
                })),
                None => {
                    warn!(username, role = %row.role, "unrecognized role in credentials file");
                    Ok(None)
                }
            };
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn credentials(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("Credentials.csv");
        fs::write(
            &path,
            "username,password,role\n\
             carla,secret1,clinician\n\
             ned,secret2,nurse\n\
             ana,secret3,admin\n\
             mira,secret4,management\n\
             ghost,secret5,janitor\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_authenticate_matches_trimmed_pair() {
        let dir = TempDir::new().unwrap();
        let path = credentials(&dir);

        let user = authenticate(&path, " carla ", "secret1").unwrap().unwrap();
        assert_eq!(user.username, "carla");
        assert_eq!(user.role, Role::Clinician);
    }

    #[test]
    fn test_authenticate_wrong_password_denied() {
        let dir = TempDir::new().unwrap();
        let path = credentials(&dir);

        assert!(authenticate(&path, "carla", "wrong").unwrap().is_none());
    }

    #[test]
    fn test_missing_credentials_file_denies() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.csv");

        assert!(authenticate(&path, "carla", "secret1").unwrap().is_none());
    }

    #[test]
    fn test_unrecognized_role_denies() {
        let dir = TempDir::new().unwrap();
        let path = credentials(&dir);

        assert!(authenticate(&path, "ghost", "secret5").unwrap().is_none());
    }

    #[test]
    fn test_capability_table() {
        assert!(Role::Clinician.can_add_patient());
        assert!(Role::Nurse.can_remove_patient());
        assert!(!Role::Admin.can_add_patient());
        assert!(!Role::Management.can_view_note());

        assert!(Role::Clinician.can_count_visits());
        assert!(Role::Admin.can_count_visits());
        assert!(!Role::Management.can_count_visits());

        assert!(Role::Management.can_generate_statistics());
        assert!(!Role::Clinician.can_generate_statistics());

        assert!(Role::Admin.is_admin());
    }
}
