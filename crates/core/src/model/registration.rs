use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("name cannot be empty")]
    EmptyName,
}

/// Contact and profile details submitted before a quiz starts.
///
/// Only `name` is used by the quiz itself; the remaining fields are kept
/// verbatim for whichever registration sink is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    name: String,
    phone: String,
    experience: String,
    company: String,
    notice_period: String,
    registered_at: DateTime<Utc>,
}

impl Registration {
    /// Validate and build a registration.
    ///
    /// The name is trimmed; other fields are stored as given.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::EmptyName` if the name is blank.
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        experience: impl Into<String>,
        company: impl Into<String>,
        notice_period: impl Into<String>,
        registered_at: DateTime<Utc>,
    ) -> Result<Self, RegistrationError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }

        Ok(Self {
            name,
            phone: phone.into(),
            experience: experience.into(),
            company: company.into(),
            notice_period: notice_period.into(),
            registered_at,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub fn experience(&self) -> &str {
        &self.experience
    }

    #[must_use]
    pub fn company(&self) -> &str {
        &self.company
    }

    #[must_use]
    pub fn notice_period(&self) -> &str {
        &self.notice_period
    }

    #[must_use]
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}
