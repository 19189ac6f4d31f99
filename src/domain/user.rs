use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{TypeConstraintError, UserEmail, UserId, UserName};

/// Account that leads can be assigned to.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: UserName,
    pub email: UserEmail,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub username: UserName,
    pub email: UserEmail,
    pub is_superuser: bool,
}

impl NewUser {
    #[must_use]
    pub fn new(username: UserName, email: UserEmail, is_superuser: bool) -> Self {
        Self {
            username,
            email,
            is_superuser,
        }
    }

    /// Builds a user from raw strings, validating name and email.
    pub fn try_new(
        username: impl Into<String>,
        email: impl Into<String>,
        is_superuser: bool,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self::new(
            UserName::new(username)?,
            UserEmail::new(email)?,
            is_superuser,
        ))
    }
}
