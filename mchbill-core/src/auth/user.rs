//! Account records

use super::role::Role;
use serde::{Deserialize, Serialize};

/// An account as persisted in the user registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub email: String,
    /// Plaintext credential or an Argon2 PHC string
    pub password: String,
    #[serde(rename = "fullName", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: Role,
}

impl StoredUser {
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.trim().to_lowercase() == email.trim().to_lowercase()
    }
}

/// Account view without its credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(rename = "fullName", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: Role,
}

impl From<&StoredUser> for SessionUser {
    fn from(user: &StoredUser) -> Self {
        SessionUser {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

/// The persisted pointer to the signed-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SessionRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_shape() {
        let user = StoredUser {
            id: "admin-1".to_string(),
            email: "admin@hospital.local".to_string(),
            password: "admin123".to_string(),
            full_name: Some("Administrator".to_string()),
            role: Role::Admin,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["fullName"], "Administrator");
        assert_eq!(value["role"], "admin");

        let session = SessionUser::from(&user);
        assert!(serde_json::to_value(&session).unwrap().get("password").is_none());
    }

    #[test]
    fn test_full_name_optional() {
        let user: StoredUser = serde_json::from_str(
            r#"{"id":"u","email":"a@b","password":"p","role":"viewer"}"#,
        )
        .unwrap();
        assert_eq!(user.full_name, None);
        assert!(user.email_matches(" A@B "));
    }

    #[test]
    fn test_session_record_shape() {
        let record: SessionRecord = serde_json::from_str(r#"{"userId":"admin-1"}"#).unwrap();
        assert_eq!(record.user_id, "admin-1");
    }
}
