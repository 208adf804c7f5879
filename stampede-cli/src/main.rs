use anyhow::{bail, Context, Result};
use clap::Parser;
use stampede_config::{ConfigLoader, StampedeConfig};
use stampede_http::{ClientConfig, HttpManager};
use stampede_logging::{init_logging_from_config, init_simple_tracing, LogLevel, LoggingGuard};
use stampede_session::{
    fingerprint, CredentialPool, Session, SessionSettings, SubjectCache, Teardown, TeardownReport,
};
use stampede_swarm::SwarmRunner;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

mod cli;
use cli::{Cli, Commands, ConfigCommands};

/// Command-line values that win over the file and the environment
#[derive(Debug, Default)]
struct Overrides {
    log_level: Option<LogLevel>,
    users: Option<usize>,
    run_time: Option<Duration>,
    no_revoke: bool,
}

impl Overrides {
    fn from_cli(cli: &Cli) -> Self {
        let mut overrides = Self {
            log_level: cli.log_level,
            ..Self::default()
        };
        if let Some(Commands::Run {
            users,
            run_time,
            no_revoke,
        }) = &cli.command
        {
            overrides.users = *users;
            overrides.run_time = *run_time;
            overrides.no_revoke = *no_revoke;
        }
        overrides
    }

    fn apply(&self, config: &mut StampedeConfig) {
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(users) = self.users {
            config.load.users = users;
        }
        if self.run_time.is_some() {
            config.load.run_time = self.run_time;
        }
        if self.no_revoke {
            config.load.revoke_on_shutdown = false;
        }
    }
}

/// Load configuration from file or from the environment alone, apply the
/// command-line overrides, then validate once
fn load_config(config_path: Option<&PathBuf>, overrides: &Overrides) -> Result<StampedeConfig> {
    let mut config = ConfigLoader::new()
        .read(config_path)
        .with_context(|| match config_path {
            Some(path) => format!("Failed to load configuration from {:?}", path),
            None => "Failed to load configuration from environment".to_string(),
        })?;

    overrides.apply(&mut config);
    config.validate_all().context("Invalid configuration")?;
    Ok(config)
}

/// Load configuration and start logging; the guard must outlive the command
fn prepare(cli: &Cli) -> Result<(StampedeConfig, LoggingGuard)> {
    let config = load_config(cli.config.as_ref(), &Overrides::from_cli(cli))?;

    let guard =
        init_logging_from_config(&config.logging).context("Failed to initialize logging")?;
    debug!(config = ?cli.config, "Configuration loaded");
    Ok((config, guard))
}

fn load_pool(config: &StampedeConfig) -> Result<CredentialPool> {
    CredentialPool::load(&config.credentials.source).context("Failed to load credential pool")
}

fn http_client(config: &StampedeConfig) -> Result<HttpManager> {
    HttpManager::with_config(ClientConfig::from(&config.http))
        .context("Failed to create HTTP client")
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, stopping users");
}

async fn run_command(config: StampedeConfig) -> Result<()> {
    let pool = Arc::new(load_pool(&config)?);
    let runner = SwarmRunner::new(config, pool, Arc::new(SubjectCache::new()))
        .context("Failed to set up swarm")?;

    let summary = runner
        .run(shutdown_signal())
        .await
        .context("Swarm run failed")?;

    info!(
        users = summary.users,
        forced = summary.forced,
        "Swarm finished"
    );
    if let Some(report) = summary.teardown {
        print_teardown(&report);
    }
    Ok(())
}

async fn revoke_command(config: StampedeConfig) -> Result<()> {
    let pool = load_pool(&config)?;
    if !pool.is_revocable() {
        bail!("Only file-backed credential pools are revoked; set STAMPEDE_TOKENS_FILE");
    }
    let client = config
        .credentials
        .client
        .as_ref()
        .context("Revocation needs STAMPEDE_CLIENT_ID and STAMPEDE_CLIENT_SECRET")?;

    let report = Teardown::new(&config.target, client)
        .with_interval(config.load.revoke_interval)
        .run(&http_client(&config)?, &pool)
        .await;

    print_teardown(&report);
    if !report.all_succeeded() {
        bail!(
            "{} of {} revocations failed",
            report.failed(),
            report.attempted()
        );
    }
    Ok(())
}

async fn whoami_command(config: StampedeConfig) -> Result<()> {
    let pool = load_pool(&config)?;
    let token = pool.tokens().next().context("Credential pool is empty")?;

    let mut session = Session::with_token(
        0,
        token,
        http_client(&config)?,
        Arc::new(SessionSettings::from_config(&config)),
        Arc::new(SubjectCache::new()),
    );

    let subject = session.resolve_subject().await;
    if subject.is_empty() {
        bail!(
            "Could not resolve the subject of token {}",
            fingerprint(token)
        );
    }
    println!("{}", subject);
    Ok(())
}

fn print_teardown(report: &TeardownReport) {
    println!(
        "Revoked {}/{} tokens",
        report.succeeded(),
        report.attempted()
    );
    for outcome in report.failures() {
        if let Err(ref e) = outcome.result {
            println!("  #{} {}: {}", outcome.index, outcome.fingerprint, e);
        }
    }
}

/// Handle configuration validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        bail!("Configuration file not found: {:?}", config_file);
    }

    match load_config(Some(config_file), &Overrides::default()) {
        Ok(_config) => {
            println!("✅ Configuration file is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed: {:#}", e);
            error!("Configuration validation failed: {:#}", e);
            Err(e)
        }
    }
}

/// Handle configuration generation
fn handle_config_generate(output: &PathBuf, force: bool) -> Result<()> {
    info!("Generating sample configuration at: {:?}", output);

    if output.exists() && !force {
        bail!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        );
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create output directory")?;
        }
    }

    fs::write(output, StampedeConfig::generate_sample())
        .with_context(|| format!("Failed to write configuration to {:?}", output))?;
    println!("✅ Sample configuration written to {:?}", output);
    Ok(())
}

/// Print the effective configuration
fn handle_config_show(cli: &Cli, format: &str) -> Result<()> {
    let config = load_config(cli.config.as_ref(), &Overrides::from_cli(cli))?;

    let rendered = match format.to_lowercase().as_str() {
        "yaml" | "yml" => {
            serde_yaml::to_string(&config).context("Failed to serialize configuration")?
        }
        "json" => {
            serde_json::to_string_pretty(&config).context("Failed to serialize configuration")?
        }
        other => bail!("Unknown format: {}. Valid formats: yaml, json", other),
    };
    println!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Run { .. }) => {
            let (config, _guard) = prepare(&cli)?;
            run_command(config).await
        }
        Some(Commands::Revoke) => {
            let (config, _guard) = prepare(&cli)?;
            revoke_command(config).await
        }
        Some(Commands::Whoami) => {
            let (config, _guard) = prepare(&cli)?;
            whoami_command(config).await
        }
        Some(Commands::Config { config_cmd }) => {
            let level = cli.log_level.unwrap_or(LogLevel::Warn);
            init_simple_tracing(level.as_str())?;
            match config_cmd {
                ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
                ConfigCommands::Generate { output, force } => {
                    handle_config_generate(output, *force)
                }
                ConfigCommands::Show { format } => handle_config_show(&cli, format),
            }
        }
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("configs").join("stampede.yaml");

        handle_config_generate(&output, false).unwrap();
        assert!(handle_config_generate(&output, false).is_err());
        handle_config_generate(&output, true).unwrap();

        handle_config_validate(&output).unwrap();
    }

    #[test]
    fn test_command_line_overrides_rescue_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stampede.yaml");
        fs::write(&path, "load:\n  users: 0\n").unwrap();

        assert!(load_config(Some(&path), &Overrides::default()).is_err());

        let cli = Cli::try_parse_from([
            "stampede",
            "--log-level",
            "error",
            "run",
            "--users",
            "5",
            "--run-time",
            "0.5",
            "--no-revoke",
        ])
        .unwrap();
        let config = load_config(Some(&path), &Overrides::from_cli(&cli)).unwrap();
        assert_eq!(config.load.users, 5);
        assert_eq!(config.load.run_time, Some(Duration::from_millis(500)));
        assert!(!config.load.revoke_on_shutdown);
        assert_eq!(config.logging.level, LogLevel::Error);
    }

    #[test]
    fn test_overrides_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stampede.yaml");
        fs::write(&path, "load:\n  users: 3\n").unwrap();

        let cli = Cli::try_parse_from(["stampede", "run", "--users", "0"]).unwrap();
        let err = load_config(Some(&path), &Overrides::from_cli(&cli)).unwrap_err();
        assert!(format!("{:#}", err).contains("users"));
    }

    #[test]
    fn test_validate_missing_file() {
        let missing = PathBuf::from("/no/such/stampede.yaml");
        assert!(handle_config_validate(&missing).is_err());
    }
}
