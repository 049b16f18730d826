// ABOUTME: Current-user record persisted by the login flow
// ABOUTME: Read-only here; its uuid scopes every backend request

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConsoleError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub uuid: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl CurrentUser {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|_| ConsoleError::validation("User UUID not found"))?;
        let user: CurrentUser = serde_json::from_str(&raw)?;
        if user.uuid.trim().is_empty() {
            return Err(ConsoleError::validation("User UUID not found"));
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_stored_user() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"uuid":"0b6f","email":"ops@example.com","firstName":"Ada"}}"#).unwrap();
        let user = CurrentUser::load(file.path()).unwrap();
        assert_eq!(user.uuid, "0b6f");
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn blank_uuid_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"uuid":"  "}}"#).unwrap();
        assert!(CurrentUser::load(file.path()).unwrap_err().is_validation());
    }

    #[test]
    fn missing_file_is_validation_error() {
        let err = CurrentUser::load(Path::new("/nonexistent/user.json")).unwrap_err();
        assert!(err.is_validation());
    }
}
