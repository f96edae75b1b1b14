use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::Display;
use uuid::Uuid;

/// Minimal projection of a user account. Authentication lives outside
/// this crate; the core only needs identity, display name, gender (for
/// pairing preference) and the role tag.
#[derive(FromRow, Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub gender: Option<Gender>,
    pub role: SystemRole,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub display_name: String,
    pub gender: Option<Gender>,
    pub role: SystemRole,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    sqlx::Type,
    Display,
    Serialize,
    Deserialize,
)]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, sqlx::Type, Display, Serialize, Deserialize,
)]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    User,
    Admin,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == SystemRole::Admin
    }
}
