use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption, Properties};

use crate::error::{InventoryError, RecordError};
use crate::scanner::RENEWAL_SUFFIX;

/// Section holding certificate paths
const DEFAULT_SECTION: &str = "default";

/// Paths of one certificate as declared in its renewal record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenewalRecord {
    /// Certificate name, file name of the record without `.conf`
    pub name: String,
    /// Value of `cert`
    pub cert_path: Option<PathBuf>,
    /// Value of `fullchain`
    pub fullchain_path: Option<PathBuf>,
}

impl RenewalRecord {
    /// Read and parse `<dir>/<filename>`
    ///
    /// Any failure is reported against `filename`.
    pub fn load<T>(dir: &Path, filename: T) -> Result<Self, InventoryError>
    where
        T: AsRef<str>,
    {
        let filename = filename.as_ref();
        let name = filename.strip_suffix(RENEWAL_SUFFIX).unwrap_or(filename);
        let record_error = |source: RecordError| InventoryError::Record {
            filename: filename.to_string(),
            source,
        };

        let content = fs::read_to_string(dir.join(filename))
            .map_err(|e| record_error(RecordError::Io(e)))?;
        Self::parse(name, &content).map_err(record_error)
    }

    /// Parse the content of a renewal record
    ///
    /// Certbot writes top-level keys without a section header, so one is
    /// added when the content does not open with a section.
    ///
    /// ```
    /// # use cci::RenewalRecord;
    /// let record = RenewalRecord::parse("example.com", "fullchain = /tmp/fullchain.pem").unwrap();
    /// assert_eq!(None, record.cert_path);
    /// assert!(record.fullchain_path.is_some());
    /// ```
    pub fn parse<T>(name: T, content: &str) -> Result<Self, RecordError>
    where
        T: Into<String>,
    {
        let ini = if content.trim_start().starts_with('[') {
            load_ini(content)?
        } else {
            load_ini(&format!("[{DEFAULT_SECTION}]\n{content}"))?
        };

        check_duplicates(&ini)?;

        let (cert_path, fullchain_path) = match ini.section(Some(DEFAULT_SECTION)) {
            Some(section) => (value(section, "cert"), value(section, "fullchain")),
            None => (None, None),
        };
        Ok(RenewalRecord {
            name: name.into(),
            cert_path,
            fullchain_path,
        })
    }
}

fn load_ini(content: &str) -> Result<Ini, ini::ParseError> {
    // keep paths verbatim
    let opt = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    };
    Ini::load_from_str_opt(content, opt)
}

/// Reject repeated sections, and keys repeated within a section
///
/// Key names compare ignoring ASCII case, section names exactly.
fn check_duplicates(ini: &Ini) -> Result<(), RecordError> {
    let mut sections = HashSet::new();
    for (section, properties) in ini.iter() {
        let section = match section {
            Some(s) => s,
            None => continue,
        };
        if !sections.insert(section) {
            return Err(RecordError::DuplicateSection(section.to_string()));
        }
        let mut keys = HashSet::new();
        for (key, _) in properties.iter() {
            if !keys.insert(key.to_ascii_lowercase()) {
                return Err(RecordError::DuplicateKey {
                    section: section.to_string(),
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn value(section: &Properties, key: &str) -> Option<PathBuf> {
    section
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| PathBuf::from(v))
}
