use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use log::{debug, warn};

use crate::inspector::ExpiryInspector;

/// Remaining days reported when the expiration time is unknown
pub const UNKNOWN_DAYS: i64 = -1;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Expiration of a certificate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Expiry {
    /// Expiration time could not be determined
    #[default]
    Unknown,
    /// Expiration time read from the chain file
    Resolved {
        /// `notAfter` in UTC, whole seconds
        not_after: NaiveDateTime,
        /// Whole days from the check to `not_after`, rounded down
        days: i64,
    },
}

impl Expiry {
    /// Compute remaining days of `not_after` as seen at `now`
    ///
    /// ```
    /// # use cci::Expiry;
    /// use chrono::NaiveDate;
    /// let now = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
    /// let not_after = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap().and_hms_opt(12, 0, 0).unwrap();
    /// assert_eq!(9, Expiry::at(not_after, now).days_until_expiration());
    /// ```
    pub fn at(not_after: NaiveDateTime, now: NaiveDateTime) -> Self {
        let seconds = (not_after - now).num_seconds();
        Expiry::Resolved {
            not_after,
            days: seconds.div_euclid(SECONDS_PER_DAY),
        }
    }

    /// Remaining days, or [`UNKNOWN_DAYS`] when unknown
    pub fn days_until_expiration(&self) -> i64 {
        match self {
            Expiry::Unknown => UNKNOWN_DAYS,
            Expiry::Resolved { days, .. } => *days,
        }
    }

    /// Expiration time, if known
    pub fn not_after(&self) -> Option<NaiveDateTime> {
        match self {
            Expiry::Unknown => None,
            Expiry::Resolved { not_after, .. } => Some(*not_after),
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Unknown => write!(f, "unknown"),
            Expiry::Resolved { not_after, .. } => {
                write!(f, "{}", not_after.format("%Y-%m-%d %H:%M:%S"))
            }
        }
    }
}

/// Resolve the expiration of the chain file at `path`
///
/// Failures are logged and turn into [`Expiry::Unknown`].
pub async fn resolve<I>(inspector: &I, path: Option<&Path>, now: NaiveDateTime) -> Expiry
where
    I: ExpiryInspector,
{
    let path = match path {
        Some(p) => p,
        None => {
            debug!("no chain file to inspect");
            return Expiry::Unknown;
        }
    };
    match inspector.not_after(path).await {
        Ok(not_after) => Expiry::at(not_after, now),
        Err(e) => {
            warn!("failed to resolve expiration of {}: {e}", path.display());
            Expiry::Unknown
        }
    }
}
