//! User model
//!
//! Staff accounts. Citizens are not users; they only appear as fields
//! of an appointment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Staff member with access to the agenda.
///
/// Every non-admin user is attached to exactly one CRAS unit and only sees
/// and changes records of that unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Full name
    pub name: String,
    /// Login email (unique, stored lowercased)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// CRAS unit the user works at (None only for admins)
    #[serde(default)]
    pub cras_id: Option<Uuid>,
    /// Whether the account may log in and be scheduled
    #[serde(default = "default_active")]
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Create a new active user.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        role: UserRole,
        cras_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: email.to_lowercase(),
            password_hash,
            role,
            cras_id,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the user is an interviewer
    pub fn is_interviewer(&self) -> bool {
        self.role == UserRole::Entrevistador
    }

    /// Check if the user may book, edit and cancel appointments for citizens
    pub fn can_manage_appointments(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Recepcao)
    }

    /// Check if the user works at the given unit. Admins belong everywhere.
    pub fn belongs_to(&self, cras_id: Uuid) -> bool {
        self.is_admin() || self.cras_id == Some(cras_id)
    }
}

/// User role for authorization.
///
/// - Admin: manages units, users and every agenda
/// - Recepcao: front desk, books appointments on behalf of citizens
/// - Entrevistador: conducts interviews in the booked slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Recepcao,
    Entrevistador,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Recepcao
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Recepcao => write!(f, "recepcao"),
            UserRole::Entrevistador => write!(f, "entrevistador"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "recepcao" | "recepção" => Ok(UserRole::Recepcao),
            "entrevistador" => Ok(UserRole::Entrevistador),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    pub role: UserRole,
    pub cras_id: Option<Uuid>,
}

/// Input for updating a user
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    /// New password (will be hashed)
    pub password: Option<String>,
    pub role: Option<UserRole>,
    /// `Some(None)` detaches the user from any unit
    pub cras_id: Option<Option<Uuid>>,
    pub active: Option<bool>,
}

impl UpdateUserInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.email.is_some()
            || self.password.is_some()
            || self.role.is_some()
            || self.cras_id.is_some()
            || self.active.is_some()
    }
}
