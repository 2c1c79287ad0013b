//! User Model

use serde::{Deserialize, Serialize};

/// Role of an identity.
///
/// Stored as nullable text: only `"admin"` carries meaning, anything else
/// (including NULL) is an ordinary user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// User entity, keyed by email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    /// Raw stored role; use [`User::role`] for the typed value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub created_at: i64,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_db(self.role.as_deref())
    }
}

/// Sign-up payload (upsert-by-email)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_db() {
        assert_eq!(Role::from_db(Some("admin")), Role::Admin);
        assert_eq!(Role::from_db(Some("Admin")), Role::User);
        assert_eq!(Role::from_db(Some("chef")), Role::User);
        assert_eq!(Role::from_db(None), Role::User);
    }

    #[test]
    fn test_user_serializes_role_only_when_set() {
        let user = User {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            name: None,
            photo_url: None,
            role: None,
            created_at: 0,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("role").is_none());
        assert_eq!(user.role(), Role::User);
    }
}
