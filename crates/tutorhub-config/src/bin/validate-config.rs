//! Config validation CLI tool
//!
//! Validates a tutorhubd configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use tutorhub_config::ClaimPolicy;
use tutorhub_util::default_config_path;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a tutorhubd configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!(
            "Error: Configuration file not found: {}",
            config_path.display()
        );
        return ExitCode::from(1);
    }

    match tutorhub_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!(
                "  Config version: {}",
                tutorhub_config::CURRENT_CONFIG_VERSION
            );
            println!("  Socket: {}", settings.service.socket_path.display());
            println!("  Data dir: {}", settings.service.data_dir.display());
            println!(
                "  Default session window: {} - {}",
                settings.session_defaults.start.format("%H:%M"),
                settings.session_defaults.end.format("%H:%M")
            );
            let policy = match settings.claim_policy {
                ClaimPolicy::AnyTutor => "any-tutor",
                ClaimPolicy::AdminOnly => "admin-only",
            };
            println!("  Claim policy: {}", policy);

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                tutorhub_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                tutorhub_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                tutorhub_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                tutorhub_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        tutorhub_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
