// ── User account domain types ──

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Account role. Unknown role names are kept as served.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[default]
    Operator,
    Other(String),
}

impl Role {
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("admin") => Self::Admin,
            Some("operador") | None => Self::Operator,
            Some(other) => Self::Other(other.to_owned()),
        }
    }

    /// Name the server stores (`admin`, `operador`).
    pub fn wire_name(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operador",
            Self::Other(s) => s,
        }
    }

    /// Parse user input: accepts wire names and English names.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Self::Admin,
            "operador" | "operator" => Self::Operator,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A user account as listed by the admin panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub active: bool,
    pub created_at: Option<String>,
    pub last_access: Option<String>,
}

/// Form contents for the create/update upsert. `id: None` creates.
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub id: Option<i64>,
    pub username: String,
    /// Required on create; left out on update to keep the current one.
    pub password: Option<SecretString>,
    pub role: Role,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}

impl UserDraft {
    /// Pre-fill an edit form from an existing account.
    pub fn edit(user: &User) -> Self {
        Self {
            id: Some(user.id),
            username: user.username.clone(),
            password: None,
            role: user.role.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            active: Some(user.active),
        }
    }

    pub fn is_create(&self) -> bool {
        self.id.is_none()
    }
}
