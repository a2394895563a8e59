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

//! Ansible module reporting certificates managed by certbot
//!
//! Prints one JSON object on standard output, following the convention of
//! Ansible binary modules.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use cci::{
    CertificateJSON, CertificateRecord, Inventory, InventoryError, OpenSsl, DEFAULT_RENEWAL_DIR,
};
use clap::Parser;
use log::debug;
use serde::Serialize;
use supports_unicode::Stream;

#[derive(Debug, Parser)]
#[command(author, about, version)]
struct Opts {
    /// Directory holding certbot renewal records
    #[arg(long, env = "CERTBOT_RENEWAL_DIR", default_value = DEFAULT_RENEWAL_DIR)]
    renewal_dir: PathBuf,
    /// OpenSSL program used to read expiration dates
    #[arg(long, env = "OPENSSL", default_value = "openssl")]
    openssl: PathBuf,
    /// Time limit of one inspection in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,
    /// Inspections running at once
    #[arg(short, long, default_value = "4")]
    jobs: usize,
    /// Print one line per certificate instead of JSON
    #[arg(long)]
    text: bool,
    /// ASCII
    #[arg(long)]
    ascii: bool,
    /// Grace period in days
    #[arg(short, long = "grace", default_value = "7")]
    grace_in_days: i64,
    /// Module arguments file given by Ansible, this module takes no options
    #[arg()]
    args_file: Option<PathBuf>,
}

/// Result in the shape Ansible expects from a module
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ModuleResult {
    Exit {
        changed: bool,
        certificates: Vec<CertificateJSON>,
    },
    Fail {
        failed: bool,
        msg: String,
    },
}

impl ModuleResult {
    fn exit_json(records: &[CertificateRecord]) -> Self {
        ModuleResult::Exit {
            changed: false,
            certificates: records.iter().map(CertificateJSON::new).collect(),
        }
    }

    fn fail_json(e: &InventoryError) -> Self {
        ModuleResult::Fail {
            failed: true,
            msg: e.to_string(),
        }
    }

    fn exit_code(&self) -> ExitCode {
        match self {
            ModuleResult::Exit { .. } => ExitCode::SUCCESS,
            ModuleResult::Fail { .. } => ExitCode::FAILURE,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    pretty_env_logger::init();

    let opts: Opts = Opts::parse();
    if let Some(args_file) = &opts.args_file {
        debug!("ignore module arguments in {}", args_file.display());
    }

    if opts.text {
        let unicode = !opts.ascii && supports_unicode::on(Stream::Stdout);
        for line in text_command(&opts, unicode).await? {
            println!("{line}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let result = module_command(&opts).await;
    println!("{}", serde_json::to_string(&result)?);
    Ok(result.exit_code())
}

fn build_inventory(opts: &Opts) -> Inventory<OpenSsl> {
    let inspector = OpenSsl {
        program: opts.openssl.clone(),
        timeout: Duration::from_secs(opts.timeout),
    };
    Inventory {
        renewal_dir: opts.renewal_dir.clone(),
        inspector,
        jobs: opts.jobs,
        ..Default::default()
    }
}

async fn module_command(opts: &Opts) -> ModuleResult {
    match build_inventory(opts).run().await {
        Ok(records) => ModuleResult::exit_json(&records),
        Err(e) => ModuleResult::fail_json(&e),
    }
}

async fn text_command(opts: &Opts, unicode: bool) -> anyhow::Result<Vec<String>> {
    let records = build_inventory(opts).run().await?;
    Ok(records
        .iter()
        .map(|r| {
            debug!("{}: {}", r.name, r.state(opts.grace_in_days));
            r.line(unicode, opts.grace_in_days)
        })
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;

    use std::fs;
    use std::path::Path;

    fn build_opts(renewal_dir: &Path) -> Opts {
        let renewal_dir = renewal_dir.display().to_string();
        // "false" stands in for openssl failing on every chain file
        Opts::parse_from([
            "certbot_certificates",
            "--renewal-dir",
            renewal_dir.as_str(),
            "--openssl",
            "false",
        ])
    }

    #[test]
    fn t_opts_accept_ansible_args_file() {
        let opts = Opts::parse_from(["certbot_certificates", "/tmp/ansible-args"]);
        assert_eq!(Some(PathBuf::from("/tmp/ansible-args")), opts.args_file);
        assert_eq!(PathBuf::from(DEFAULT_RENEWAL_DIR), opts.renewal_dir);
        assert_eq!(4, opts.jobs);
    }

    #[test]
    fn t_build_inventory() {
        let opts = Opts::parse_from([
            "certbot_certificates",
            "--renewal-dir",
            "/srv/letsencrypt/renewal",
            "--jobs",
            "8",
        ]);
        let inventory = build_inventory(&opts);
        assert_eq!(PathBuf::from("/srv/letsencrypt/renewal"), inventory.renewal_dir);
        assert_eq!(8, inventory.jobs);
        assert_eq!(Duration::from_secs(opts.timeout), inventory.inspector.timeout);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn t_module_command() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("example.com.conf"),
            "cert = /nonexistent/cert.pem\nfullchain = /nonexistent/fullchain.pem\n",
        )
        .unwrap();

        let result = module_command(&build_opts(dir.path())).await;
        assert!(matches!(result, ModuleResult::Exit { .. }));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            serde_json::json!({
                "changed": false,
                "certificates": [{
                    "name": "example.com",
                    "cert_path": "/nonexistent/cert.pem",
                    "fullchain_path": "/nonexistent/fullchain.pem",
                    "expiry_date": "unknown",
                    "days_until_expiration": -1,
                }],
            }),
            json
        );
    }

    #[tokio::test]
    async fn t_module_command_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("renewal");

        let result = module_command(&build_opts(&missing)).await;
        assert!(matches!(result, ModuleResult::Fail { .. }));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(serde_json::json!(true), json["failed"]);
        let msg = json["msg"].as_str().unwrap();
        assert!(msg.contains(&missing.display().to_string()), "{msg}");
        assert!(json.get("certificates").is_none());
    }

    #[tokio::test]
    async fn t_module_command_malformed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.example.com.conf"), "cert = /tmp/cert.pem\n").unwrap();
        fs::write(dir.path().join("b.example.com.conf"), "[renewalparams\n").unwrap();

        let result = module_command(&build_opts(dir.path())).await;
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            serde_json::json!({
                "failed": true,
                "msg": json["msg"].clone(),
            }),
            json
        );
        assert!(json["msg"]
            .as_str()
            .unwrap()
            .starts_with("failed to parse b.example.com.conf"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn t_text_command() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("example.com.conf"), "version = 2.11.0\n").unwrap();

        let lines = text_command(&build_opts(dir.path()), false).await.unwrap();
        assert_eq!(
            vec!["[?] expiry of certificate example.com is unknown".to_string()],
            lines
        );
    }

    #[tokio::test]
    async fn t_text_command_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let opts = build_opts(&dir.path().join("renewal"));
        assert!(text_command(&opts, false).await.is_err());
    }
}
