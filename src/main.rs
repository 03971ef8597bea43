mod commands;
mod gateway;

use chorus_channels::telegram::TelegramChannel;
use chorus_core::config::{self, ChorusConfig, ConfigSource, BOT_TOKEN_ENV};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "chorus",
    version,
    about = "Chorus — repeats what the crowd repeats"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Print the resolved configuration without contacting Telegram.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (cfg, source) = config::load(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let _log_guard = init_logging(&cfg.chorus)?;
            if source == ConfigSource::Defaults {
                info!("Config file not found at {}, using defaults", cli.config);
            }
            cfg.validate()?;

            // Build channels.
            let mut channels: HashMap<String, Arc<dyn chorus_core::traits::Channel>> =
                HashMap::new();

            if let Some(ref tg) = cfg.channel.telegram {
                if tg.enabled {
                    let channel = TelegramChannel::new(tg.clone());
                    channels.insert("telegram".to_string(), Arc::new(channel));
                }
            }

            println!("Chorus — Starting bot...");
            let gw = Arc::new(gateway::Gateway::new(channels, cfg.echo.clone()));
            gw.run().await?;
        }
        Commands::Status => {
            println!("Chorus — Status Check\n");
            match source {
                ConfigSource::File => println!("Config: {}", cli.config),
                ConfigSource::Defaults => {
                    println!("Config: {} (not found, using defaults)", cli.config)
                }
            }
            println!("Trigger count: {}", cfg.echo.trigger_count);
            println!("Time window: {}s", cfg.echo.time_window_secs);
            println!("Log level: {}", cfg.chorus.log_level);
            println!();

            if let Some(ref tg) = cfg.channel.telegram {
                println!(
                    "  telegram: {}",
                    if tg.enabled && !tg.bot_token.is_empty() {
                        "configured"
                    } else if tg.enabled {
                        "enabled but missing bot_token"
                    } else {
                        "disabled"
                    }
                );
                if !tg.allowed_chats.is_empty() {
                    println!("  allowed chats: {:?}", tg.allowed_chats);
                }
            } else {
                println!("  telegram: not configured (set {BOT_TOKEN_ENV})");
            }

            if let Err(e) = cfg.validate() {
                println!();
                println!("Config is not runnable: {e}");
            }
        }
    }

    Ok(())
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. With a `log_dir`, logs are also
/// written to `chorus.log` there; the returned guard flushes it on drop.
fn init_logging(cfg: &ChorusConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    if cfg.log_dir.is_empty() {
        registry.init();
        return Ok(None);
    }

    let dir = Path::new(&cfg.log_dir);
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("failed to create log dir {}: {e}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir,
        "chorus.log",
    ));
    registry
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}
