//! Config validation CLI tool
//!
//! Validates a clustermapd configuration file and reports any errors.

use clustermap_api::ExamSessionConflict;
use clustermap_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a clustermapd configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match clustermap_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", clustermap_config::CURRENT_CONFIG_VERSION);
            println!("  Listen: {}", settings.server.listen);
            if !settings.server.base_path.is_empty() {
                println!("  Base path: {}", settings.server.base_path);
            }
            println!("  Response TTL: {}s", settings.cache.response_ttl.as_secs());
            match &settings.oracle.base_url {
                Some(url) => println!(
                    "  Oracle: {} (timeout {}ms)",
                    url,
                    settings.oracle.timeout.as_millis()
                ),
                None => println!("  Oracle: disabled"),
            }
            println!("  Cluster database: {}", settings.sources.cluster_db.display());
            println!("  Exam database: {}", settings.sources.exam_db.display());
            if let Some(domain) = &settings.sources.domain {
                println!("  Hostname domain: {}", domain);
            }
            let conflict = match settings.reconcile.exam_session_conflict {
                ExamSessionConflict::KeepFirst => "keep_first",
                ExamSessionConflict::Overwrite => "overwrite",
            };
            println!("  Exam session conflict: {}", conflict);

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                clustermap_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                clustermap_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                clustermap_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                clustermap_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        clustermap_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
