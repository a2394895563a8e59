use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::error::InventoryError;

/// Suffix of renewal records
pub(crate) const RENEWAL_SUFFIX: &str = ".conf";

/// File names of renewal records directly inside `dir`, in directory order
pub(crate) fn scan(dir: &Path) -> Result<Vec<String>, InventoryError> {
    if !dir.is_dir() {
        return Err(InventoryError::MissingDirectory(dir.to_path_buf()));
    }

    let read_dir_error = |source| InventoryError::ReadDirectory {
        dir: dir.to_path_buf(),
        source,
    };

    let mut filenames = vec![];
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        let filename = match entry.file_name().into_string() {
            Ok(f) => f,
            Err(f) => {
                warn!("skip non UTF-8 file name {f:?} in {}", dir.display());
                continue;
            }
        };
        match filename.strip_suffix(RENEWAL_SUFFIX) {
            Some(name) if !name.is_empty() => (),
            _ => continue,
        }
        // follows symbolic links
        if !entry.path().is_file() {
            debug!("skip {filename}, not a regular file");
            continue;
        }
        debug!("found renewal record {filename}");
        filenames.push(filename);
    }
    Ok(filenames)
}
