use std::fmt;
use std::path::PathBuf;

use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

use crate::expiry::Expiry;
use crate::renewal::RenewalRecord;

/// Days before expiration from which a certificate is flagged
pub const DEFAULT_GRACE_IN_DAYS: i64 = 7;

/// State of certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateState {
    /// Expiration time is unknown
    Unknown,
    /// Certificate is valid
    Ok,
    /// Certificate will expire in grace period
    Warning,
    /// Certificate expired
    Expired,
}

impl fmt::Display for CertificateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateState::Unknown => write!(f, "UNKNOWN"),
            CertificateState::Ok => write!(f, "OK"),
            CertificateState::Warning => write!(f, "WARNING"),
            CertificateState::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// One certificate managed by certbot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateRecord {
    /// Certificate name, file name of the renewal record without `.conf`
    pub name: String,
    /// Leaf certificate declared by the renewal record
    pub cert_path: Option<PathBuf>,
    /// Chain file declared by the renewal record
    pub fullchain_path: Option<PathBuf>,
    /// Expiration of the chain file
    pub expiry: Expiry,
}

impl CertificateRecord {
    /// Create a record from a renewal record and its resolved expiration
    pub fn new(renewal: RenewalRecord, expiry: Expiry) -> Self {
        CertificateRecord {
            name: renewal.name,
            cert_path: renewal.cert_path,
            fullchain_path: renewal.fullchain_path,
            expiry,
        }
    }

    /// Remaining days, `-1` when the expiration time is unknown
    pub fn days_until_expiration(&self) -> i64 {
        self.expiry.days_until_expiration()
    }

    /// State of certificate given a grace period
    ///
    /// ```
    /// # use cci::{CertificateRecord, CertificateState};
    /// let record = CertificateRecord::default();
    /// assert_eq!(CertificateState::Unknown, record.state(7));
    /// ```
    pub fn state(&self, grace_in_days: i64) -> CertificateState {
        match self.expiry {
            Expiry::Unknown => CertificateState::Unknown,
            Expiry::Resolved { days, .. } if days < 0 => CertificateState::Expired,
            Expiry::Resolved { days, .. } if days < grace_in_days => CertificateState::Warning,
            Expiry::Resolved { .. } => CertificateState::Ok,
        }
    }

    /// Human-readable sentence of certificate state
    pub fn sentence(&self) -> String {
        let name = &self.name;
        let expiry = &self.expiry;
        match self.expiry {
            Expiry::Unknown => format!("expiry of certificate {name} is unknown"),
            Expiry::Resolved { days, .. } if days < 0 => {
                format!("certificate of {name} has expired ({expiry})")
            }
            Expiry::Resolved { days, .. } => {
                let days = days.to_formatted_string(&Locale::en);
                format!("certificate of {name} expires in {days} days ({expiry})")
            }
        }
    }

    /// Icon of certificate state in ASCII or Unicode
    pub fn state_icon(&self, unicode: bool, grace_in_days: i64) -> &'static str {
        match self.state(grace_in_days) {
            CertificateState::Unknown => {
                if unicode {
                    "\u{2753}"
                } else {
                    "[?]"
                }
            }
            CertificateState::Ok => {
                if unicode {
                    "\u{2705}"
                } else {
                    "[v]"
                }
            }
            CertificateState::Warning => {
                if unicode {
                    "\u{26a0}\u{fe0f}"
                } else {
                    "[-]"
                }
            }
            CertificateState::Expired => {
                if unicode {
                    "\u{274c}"
                } else {
                    "[x]"
                }
            }
        }
    }

    /// Icon followed by sentence
    pub fn line(&self, unicode: bool, grace_in_days: i64) -> String {
        format!(
            "{} {}",
            self.state_icon(unicode, grace_in_days),
            self.sentence()
        )
    }
}

impl fmt::Display for CertificateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line(false, DEFAULT_GRACE_IN_DAYS))
    }
}

/// Certificate record in JSON format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateJSON {
    /// Certificate name
    pub name: String,
    /// Leaf certificate path
    pub cert_path: Option<PathBuf>,
    /// Chain file path
    pub fullchain_path: Option<PathBuf>,
    /// Expiration time as `YYYY-MM-DD HH:MM:SS`, or `unknown`
    pub expiry_date: String,
    /// Remaining days, `-1` when the expiration time is unknown
    pub days_until_expiration: i64,
}

impl CertificateJSON {
    /// Convert record to JSON
    ///
    /// ```
    /// # use cci::{CertificateJSON, CertificateRecord};
    /// let record = CertificateRecord {
    ///     name: "example.com".into(),
    ///     ..Default::default()
    /// };
    /// let json = CertificateJSON::new(&record);
    /// assert_eq!("unknown", json.expiry_date);
    /// assert_eq!(-1, json.days_until_expiration);
    /// ```
    pub fn new(record: &CertificateRecord) -> CertificateJSON {
        CertificateJSON {
            name: record.name.clone(),
            cert_path: record.cert_path.clone(),
            fullchain_path: record.fullchain_path.clone(),
            expiry_date: record.expiry.to_string(),
            days_until_expiration: record.days_until_expiration(),
        }
    }
}
