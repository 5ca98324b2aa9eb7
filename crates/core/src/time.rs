use chrono::{DateTime, Duration, Utc};

/// Where services read the current time from.
///
/// Production uses the wall clock; tests pin a timestamp so session
/// stamps and expiry cutoffs are reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }

    /// Oldest activity time still considered live for the given lifetime.
    ///
    /// Saturates at the earliest representable time instead of overflowing.
    #[must_use]
    pub fn cutoff(&self, lifetime: Duration) -> DateTime<Utc> {
        let now = self.now();
        now.checked_sub_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// 2023-11-14T22:13:20Z, the instant pinned by [`fixed_now`].
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// # Panics
///
/// Panics if [`FIXED_TEST_TIMESTAMP`] is out of range for `DateTime<Utc>`.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
