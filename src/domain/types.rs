//! Value objects carried by leads and users.
//!
//! Constructors are the only way in, so a `LeadPhone` or an `IntentionLevel`
//! held by the domain layer is already known to be valid.
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

/// Reasons a raw value was refused by a value object constructor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    #[error("id must be greater than zero")]
    NonPositiveId,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("value cannot be empty")]
    EmptyString,
    #[error("intention level must be between {min} and {max}", min = IntentionLevel::MIN, max = IntentionLevel::MAX)]
    IntentionLevelOutOfRange,
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Returns the trimmed text, or `EmptyString` when nothing is left.
fn trimmed(value: impl Into<String>) -> Result<String, TypeConstraintError> {
    let value = value.into();
    let text = value.trim();
    if text.is_empty() {
        Err(TypeConstraintError::EmptyString)
    } else {
        Ok(text.to_owned())
    }
}

/// Positive integer key wrapped in its own type so lead and user ids never mix.
macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i32", into = "i32")]
        pub struct $name(i32);

        impl $name {
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                (value > 0)
                    .then_some(Self(value))
                    .ok_or(TypeConstraintError::NonPositiveId)
            }

            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> i32 {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

/// Trimmed text that is never empty.
macro_rules! required_text {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, TypeConstraintError> {
                trimmed(value).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

positive_id!(
    /// Primary key of a lead.
    LeadId
);
positive_id!(
    /// Primary key of a user; also the owner key of a lead.
    UserId
);

required_text!(
    /// Phone number as entered by the operator. No format is imposed.
    LeadPhone
);
required_text!(
    /// WeChat contact handle.
    WechatHandle
);
required_text!(UserName);

/// Lower-cased, syntactically valid email address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserEmail(String);

impl UserEmail {
    pub fn new(email: impl Into<String>) -> Result<Self, TypeConstraintError> {
        let email = email.into().trim().to_lowercase();
        if email.validate_email() {
            Ok(Self(email))
        } else {
            Err(TypeConstraintError::InvalidEmail)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-form note on a lead, stored as the trimmed text the caller sent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadRemark(String);

impl LeadRemark {
    pub fn new(value: impl Into<String>) -> Result<Self, TypeConstraintError> {
        trimmed(value).map(Self)
    }

    /// Blank input counts as no remark at all.
    pub fn from_optional(value: Option<String>) -> Option<Self> {
        value.and_then(|remark| Self::new(remark).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadRemark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How likely a lead is to convert, from 1 (cold) to 5 (hot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct IntentionLevel(i32);

impl IntentionLevel {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 5;

    pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::IntentionLevelOutOfRange)
        }
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for IntentionLevel {
    type Error = TypeConstraintError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IntentionLevel> for i32 {
    fn from(level: IntentionLevel) -> i32 {
        level.0
    }
}

impl fmt::Display for IntentionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
