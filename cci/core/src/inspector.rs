use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::NaiveDateTime;
use log::debug;
use tokio::process::Command;

use crate::error::InspectError;

const NOT_AFTER_PREFIX: &str = "notAfter=";

/// Capability to read the expiration time of a certificate file
pub trait ExpiryInspector {
    /// `notAfter` of the first certificate in `path`, in UTC
    fn not_after(&self, path: &Path) -> impl Future<Output = Result<NaiveDateTime, InspectError>>;
}

/// Inspect certificates with `openssl x509 -noout -enddate`
#[derive(Debug, Clone)]
pub struct OpenSsl {
    /// Program to run
    pub program: PathBuf,
    /// Time limit of one invocation
    pub timeout: Duration,
}

impl Default for OpenSsl {
    fn default() -> Self {
        OpenSsl {
            program: PathBuf::from("openssl"),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ExpiryInspector for OpenSsl {
    async fn not_after(&self, path: &Path) -> Result<NaiveDateTime, InspectError> {
        let program = self.program.display().to_string();
        debug!("run {program} x509 -noout -enddate -in {}", path.display());

        let child = Command::new(&self.program)
            .args(["x509", "-noout", "-enddate", "-in"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| InspectError::Timeout(self.timeout))?
            .map_err(|source| InspectError::Spawn { program, source })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(InspectError::Exit {
                status: output.status,
                stderr,
            });
        }
        if !stderr.is_empty() {
            debug!("stderr of {}: {stderr}", path.display());
        }
        parse_end_date(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the output of `openssl x509 -noout -enddate`
///
/// ```
/// # use cci::parse_end_date;
/// let not_after = parse_end_date("notAfter=Jun 10 12:00:00 2025 GMT\n").unwrap();
/// assert_eq!("2025-06-10 12:00:00", not_after.format("%Y-%m-%d %H:%M:%S").to_string());
/// ```
pub fn parse_end_date(output: &str) -> Result<NaiveDateTime, InspectError> {
    let output = output.trim();
    let date = output
        .strip_prefix(NOT_AFTER_PREFIX)
        .ok_or_else(|| InspectError::UnexpectedOutput(output.to_string()))?
        .trim();
    let invalid = |reason: &str| InspectError::InvalidDate {
        date: date.to_string(),
        reason: reason.to_string(),
    };

    // openssl pads single-digit days with a space, e.g. "Jun  1"
    let fields: Vec<&str> = date.split_whitespace().collect();
    let (zone, fields) = match fields.split_last() {
        Some((zone, fields)) if fields.len() == 4 => (*zone, fields),
        _ => return Err(invalid("expected <month> <day> <time> <year> <zone>")),
    };
    if !zone.eq_ignore_ascii_case("GMT") && !zone.eq_ignore_ascii_case("UTC") {
        return Err(invalid("time zone is neither GMT nor UTC"));
    }
    NaiveDateTime::parse_from_str(&fields.join(" "), "%b %d %H:%M:%S %Y")
        .map_err(|e| invalid(&e.to_string()))
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use super::*;

    /// Write an executable shell script standing in for openssl
    #[cfg(unix)]
    pub(crate) fn fake_openssl(body: &str) -> (tempfile::TempDir, OpenSsl) {
        use std::fs;
        use std::os::unix::fs::PermissionsExt as _;

        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("openssl");
        fs::write(&program, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
        let inspector = OpenSsl {
            program,
            timeout: Duration::from_secs(5),
        };
        (dir, inspector)
    }

    /// Inspector answering from a fixed table, failing for unknown paths
    pub(crate) struct FakeInspector {
        pub(crate) dates: HashMap<PathBuf, NaiveDateTime>,
    }

    impl ExpiryInspector for FakeInspector {
        async fn not_after(&self, path: &Path) -> Result<NaiveDateTime, InspectError> {
            self.dates
                .get(path)
                .copied()
                .ok_or_else(|| InspectError::UnexpectedOutput(String::new()))
        }
    }
}
