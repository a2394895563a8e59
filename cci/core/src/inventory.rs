use std::path::PathBuf;

use chrono::{NaiveDateTime, SubsecRound as _, Utc};
use futures::stream::{self, StreamExt as _};
use log::{debug, info};
use logging_timer::timer;

use crate::error::InventoryError;
use crate::expiry::resolve;
use crate::inspector::{ExpiryInspector, OpenSsl};
use crate::record::CertificateRecord;
use crate::renewal::RenewalRecord;
use crate::scanner::scan;

/// Where certbot keeps renewal records
pub const DEFAULT_RENEWAL_DIR: &str = "/etc/letsencrypt/renewal";

/// Inventory of certificates managed by certbot
#[derive(Debug)]
pub struct Inventory<I = OpenSsl> {
    /// Directory holding `<name>.conf` renewal records
    pub renewal_dir: PathBuf,
    /// Reads expiration time of chain files
    pub inspector: I,
    /// When remaining days are computed from, UTC in whole seconds
    pub checked_at: NaiveDateTime,
    /// How many chain files are inspected at once
    pub jobs: usize,
}

impl Default for Inventory<OpenSsl> {
    fn default() -> Self {
        Inventory::new(DEFAULT_RENEWAL_DIR, OpenSsl::default())
    }
}

impl<I> Inventory<I>
where
    I: ExpiryInspector,
{
    /// Create an inventory of `renewal_dir` checked as of now
    ///
    /// ```
    /// # use cci::{Inventory, OpenSsl};
    /// let inventory = Inventory::new("/etc/letsencrypt/renewal", OpenSsl::default());
    /// assert_eq!(4, inventory.jobs);
    /// ```
    pub fn new<T>(renewal_dir: T, inspector: I) -> Self
    where
        T: Into<PathBuf>,
    {
        Inventory {
            renewal_dir: renewal_dir.into(),
            inspector,
            checked_at: Utc::now().naive_utc().round_subsecs(0),
            jobs: 4,
        }
    }

    /// Load every renewal record, the first failure aborts
    pub fn load_records(&self) -> Result<Vec<RenewalRecord>, InventoryError> {
        scan(&self.renewal_dir)?
            .iter()
            .map(|filename| RenewalRecord::load(&self.renewal_dir, filename))
            .collect()
    }

    /// Compute the certificate inventory
    ///
    /// Records come in directory order. Expiration failures only degrade
    /// the affected record.
    pub async fn run(&self) -> Result<Vec<CertificateRecord>, InventoryError> {
        let _timer = timer!("INVENTORY", "{}", self.renewal_dir.display());

        let renewals = self.load_records()?;
        debug!(
            "{} renewal record(s) found in {}",
            renewals.len(),
            self.renewal_dir.display()
        );

        let records: Vec<CertificateRecord> = stream::iter(renewals)
            .map(|renewal| async move {
                let expiry = resolve(
                    &self.inspector,
                    renewal.fullchain_path.as_deref(),
                    self.checked_at,
                )
                .await;
                CertificateRecord::new(renewal, expiry)
            })
            .buffered(self.jobs.max(1))
            .collect()
            .await;

        let unknown = records
            .iter()
            .filter(|r| r.expiry.not_after().is_none())
            .count();
        info!(
            "{} certificate(s) inventoried, {unknown} with unknown expiry",
            records.len()
        );
        Ok(records)
    }
}
