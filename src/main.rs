/// validate-kubectl
///
/// Checks that the locally installed kubectl reports an expected version,
/// or explicitly does not report an undesired one. Intended to run in a test
/// pipeline right after a step that installs kubectl.
mod config;
mod error;
mod k8s;
mod release;
mod utils;
mod validator;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ValidatorConfig;
use crate::validator::{Validator, VersionExpression};

#[derive(Parser)]
#[command(name = "validate-kubectl")]
#[command(about = "Validate the version of the installed kubectl", long_about = None)]
struct Cli {
    /// Version expression: `latest`, a git version such as `v1.29.2`,
    /// or `!<version>` to require that version is NOT installed
    #[arg(required_unless_present = "print_config")]
    version: Option<VersionExpression>,

    /// kubectl executable to query (overrides the config file)
    #[arg(long, env = "KUBECTL")]
    kubectl: Option<String>,

    /// URL of the stable release pointer used to resolve `latest`
    /// (overrides the config file)
    #[arg(long, env = "KUBECTL_STABLE_URL")]
    stable_url: Option<String>,

    /// Maximum attempts when fetching the stable release pointer
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Initial retry delay in seconds, doubled after each failed attempt
    #[arg(long)]
    base_delay_secs: Option<u64>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing; warnings and failures go to stderr
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(log_filter(rust_log.as_deref(), cli.verbose))
        .with(
            tracing_subscriber::fmt::layer().with_writer(
                std::io::stderr
                    .with_max_level(tracing::Level::WARN)
                    .or_else(std::io::stdout),
            ),
        )
        .init();

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// This crate's own lines stay enabled; `RUST_LOG` is layered on top
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let log_level = if verbose { "debug" } else { "info" };
    let own = format!("validate_kubectl={}", log_level);

    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(extra) => EnvFilter::new(format!("{},{}", own, extra)),
        None => EnvFilter::new(own),
    }
}

/// Returns whether the validation passed
async fn run(cli: &Cli) -> Result<bool> {
    let config = load_config(cli)?;

    if cli.print_config {
        let yaml = serde_yaml::to_string(&config)?;
        print!("{}", yaml);
        return Ok(true);
    }

    let expression = cli
        .version
        .as_ref()
        .context("A version expression is required")?;

    let validator = Validator::from_config(&config)?;

    let outcome = match validator.run(expression).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{}", e);
            return Ok(false);
        }
    };

    if outcome.passed {
        info!("{}", outcome.message);
    } else {
        error!("{}", outcome.message);
    }

    Ok(outcome.passed)
}

/// Merge the optional config file with command-line overrides
///
/// Precedence: flags, then `KUBECTL`/`KUBECTL_STABLE_URL`, then the file, then defaults.
fn load_config(cli: &Cli) -> Result<ValidatorConfig> {
    let mut config = match &cli.config {
        Some(path) => ValidatorConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ValidatorConfig::default(),
    };

    if let Some(kubectl) = &cli.kubectl {
        config.kubectl = kubectl.clone();
    }
    if let Some(stable_url) = &cli.stable_url {
        config.stable_url = stable_url.clone();
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.retry.max_attempts = max_attempts;
    }
    if let Some(base_delay_secs) = cli.base_delay_secs {
        config.retry.base_delay_secs = base_delay_secs;
    }

    config.validate().context("Invalid configuration")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let cli = Cli::parse_from([
            "validate-kubectl",
            "--kubectl",
            "/opt/bin/kubectl",
            "--max-attempts",
            "3",
            "--base-delay-secs",
            "0",
            "!v1.29.2",
        ]);

        let config = load_config(&cli).unwrap();
        assert_eq!(config.kubectl, "/opt/bin/kubectl");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_secs, 0);
        assert_eq!(
            cli.version,
            Some(VersionExpression::Negated("v1.29.2".to_string()))
        );
    }

    #[test]
    fn test_log_filter_keeps_own_lines_under_rust_log() {
        let filter = log_filter(Some("reqwest=debug"), false)
            .to_string()
            .to_lowercase();
        assert!(filter.contains("validate_kubectl=info"));
        assert!(filter.contains("reqwest=debug"));

        let filter = log_filter(None, true).to_string().to_lowercase();
        assert!(filter.contains("validate_kubectl=debug"));

        let filter = log_filter(Some("  "), false).to_string().to_lowercase();
        assert!(filter.contains("validate_kubectl=info"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::parse_from(["validate-kubectl", "--max-attempts", "0", "latest"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_version_required_unless_printing_config() {
        assert!(Cli::try_parse_from(["validate-kubectl"]).is_err());
        assert!(Cli::try_parse_from(["validate-kubectl", ""]).is_err());
        assert!(Cli::try_parse_from(["validate-kubectl", "--print-config"]).is_ok());
    }
}
