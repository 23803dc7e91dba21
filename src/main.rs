use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use botcore::application::errors::BotError;
use botcore::application::messaging::FaultReport;
use botcore::application::services::RemoteRegistrySync;
use botcore::domain::traits::{RemoteRegistry, StaticProbe};
use botcore::infrastructure::adapters::ConsoleAdapter;
use botcore::infrastructure::remote::HttpRemoteRegistry;
use botcore::{Config, Engine, HandlerTable};

#[derive(Parser)]
#[command(name = "botcore")]
#[command(about = "Command & module lifecycle engine for chat bots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load modules and dispatch commands typed on stdin
    Run {
        /// User id the console acts as
        #[arg(long, default_value = "console")]
        user: String,

        /// Treat the console as a direct message
        #[arg(long)]
        direct: bool,
    },
    /// Load every source unit and report the ones that would be skipped
    Check,
    /// Publish structured commands to the remote registry
    Deploy,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { user, direct } => {
            run_bot(load_config(&cli.config, cli.token), user, direct).await
        }
        Commands::Check => check_modules(load_config(&cli.config, cli.token)),
        Commands::Deploy => deploy(load_config(&cli.config, cli.token)).await,
        Commands::Version => {
            println!("botcore v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(config_path: &str, token_override: Option<String>) -> Config {
    let mut config = if Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    } else {
        Config::default()
    };
    config.apply_env();
    if let Some(token) = token_override {
        config.remote.token = Some(token);
    }
    config
}

/// Remote registry client plus the task logging its rate-limit notices
fn remote_registry(
    config: &Config,
) -> Result<(Arc<dyn RemoteRegistry>, tokio::task::JoinHandle<()>), BotError> {
    let credentials = config.validate_remote()?;
    let (tx, rx) = mpsc::unbounded_channel();
    let logger = RemoteRegistrySync::spawn_notice_logger(rx);
    let registry: Arc<dyn RemoteRegistry> =
        Arc::new(HttpRemoteRegistry::new(credentials).with_notices(tx));
    Ok((registry, logger))
}

async fn run_bot(config: Config, user: String, direct: bool) -> Result<(), BotError> {
    tracing::info!("Starting botcore: {}", config.bot.name);

    let remote = if config.remote.enabled {
        Some(remote_registry(&config)?)
    } else {
        None
    };

    let (fault_tx, mut fault_rx) = mpsc::unbounded_channel::<FaultReport>();
    let adapter = ConsoleAdapter::new(config.bot.name.clone()).as_user(user);
    let adapter = Arc::new(if direct { adapter.direct() } else { adapter });

    let probe = Arc::new(StaticProbe::permissive());
    let mut engine =
        Engine::new(config, HandlerTable::with_builtins(), probe).with_fault_channel(fault_tx);
    if let Some((registry, _logger)) = remote {
        engine = engine.with_remote(registry);
    }
    let engine = Arc::new(engine);

    // Operator channel
    tokio::spawn(async move {
        while let Some(fault) = fault_rx.recv().await {
            eprintln!(
                "[OPERATOR] fault {} in '{}' (user {}, channel {}): {}",
                fault.id, fault.command, fault.invoker_id, fault.channel_id, fault.detail
            );
        }
    });

    let report = engine.start().await;
    for task in report.addon_tasks {
        tokio::spawn(async move {
            if let Err(e) = task.await {
                tracing::warn!("Addon task ended abnormally: {}", e);
            }
        });
    }

    adapter.run(engine).await
}

fn check_modules(config: Config) -> Result<(), BotError> {
    let probe = Arc::new(StaticProbe::default());
    let engine = Engine::new(config, HandlerTable::with_builtins(), probe);
    let report = engine.load();

    println!(
        "{} commands, {} structured commands, {} events, {} addons",
        report.commands, report.structured, report.events, report.addons
    );
    for warning in &report.warnings {
        println!("  skipped: {}", warning);
    }

    if report.warnings.is_empty() {
        Ok(())
    } else {
        Err(BotError::Internal(format!(
            "{} source units failed to load",
            report.warnings.len()
        )))
    }
}

async fn deploy(config: Config) -> Result<(), BotError> {
    let (registry, logger) = remote_registry(&config)?;
    let probe = Arc::new(StaticProbe::default());
    let engine = Engine::new(config, HandlerTable::with_builtins(), probe).with_remote(registry);

    engine.load();
    let result = engine.deploy().await;

    // Dropping the engine closes the notice channel so the logger drains and exits
    drop(engine);
    let _ = logger.await;

    let report = result?;
    println!("Deployed {} structured commands", report.acknowledged);
    Ok(())
}

fn init_config() -> Result<(), BotError> {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| BotError::Internal(format!("Failed to render config: {}", e)))?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
