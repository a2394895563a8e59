#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! Certbot Certificate Inventory

pub use error::{InspectError, InventoryError, RecordError};
pub use expiry::{resolve, Expiry, UNKNOWN_DAYS};
pub use inspector::{parse_end_date, ExpiryInspector, OpenSsl};
pub use inventory::{Inventory, DEFAULT_RENEWAL_DIR};
pub use record::{CertificateJSON, CertificateRecord, CertificateState, DEFAULT_GRACE_IN_DAYS};
pub use renewal::RenewalRecord;

mod error;
mod expiry;
mod inspector;
mod inventory;
mod record;
mod renewal;
mod scanner;
