mod config_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    chanrelay_config::{ConfigStore, RelayPaths},
    chanrelay_forward::{
        DEFAULT_FORWARD_URL, ForwardingClient, JsonStatsStore, RelayPipeline, StatsStore, report,
    },
    chanrelay_telegram::TelegramBotConfig,
};

/// Channel posts buffered between the Telegram poller and the pipeline.
const INBOUND_QUEUE_CAPACITY: usize = 256;

#[derive(Parser)]
#[command(
    name = "chanrelay",
    about = "Relay Telegram channel posts to a WhatsApp gateway"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Directory holding config.json and telegram_stats.json.
    #[arg(long, global = true, env = "CHANRELAY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Telegram bot token.
    #[arg(long, global = true, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Forwarding endpoint of the WhatsApp gateway.
    #[arg(
        long,
        global = true,
        env = "WHATSAPP_API_URL",
        default_value = DEFAULT_FORWARD_URL
    )]
    endpoint: String,

    /// Ignore admin commands in private chats.
    #[arg(long, global = true, default_value_t = false)]
    no_admin_commands: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start relaying (default when no subcommand is provided).
    Run,
    /// Relay configuration.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Print the persisted counters.
    Stats,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mut cli = Cli::parse();
    init_telemetry(&cli);

    let paths = RelayPaths::resolve(cli.data_dir.as_deref());

    match cli.command.take() {
        None | Some(Commands::Run) => run_relay(&cli, &paths).await,
        Some(Commands::Config { action }) => config_commands::handle_config(action, &paths),
        Some(Commands::Stats) => {
            let config = paths.config_store().load();
            let stats = JsonStatsStore::new(&paths.stats_file).load();
            println!("{}\n", report::render_status(&config, &stats));
            println!("{}", report::render_stats(&stats));
            Ok(())
        },
    }
}

async fn run_relay(cli: &Cli, paths: &RelayPaths) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "chanrelay starting");

    let mut bot_config = TelegramBotConfig::new(cli.token.clone().unwrap_or_default());
    if !bot_config.has_token() {
        error!("no bot token: set TELEGRAM_BOT_TOKEN or pass --token");
        anyhow::bail!("missing Telegram bot token");
    }
    bot_config.admin_commands = !cli.no_admin_commands;

    let client = match ForwardingClient::new(&cli.endpoint) {
        Ok(client) => client,
        Err(e) => {
            error!(endpoint = %cli.endpoint, error = %e, "invalid forwarding endpoint");
            return Err(e.into());
        },
    };

    let config = paths.config_store().load();
    if !config.enabled {
        warn!("forwarding is disabled; enable it with `chanrelay config set enabled true`");
    }
    let stats_store = Arc::new(JsonStatsStore::new(&paths.stats_file));
    let stats = stats_store.load();

    let pipeline = RelayPipeline::new(config, stats, client, stats_store);
    let status = pipeline.status_view();
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
    let cancel = CancellationToken::new();
    let pipeline_task = tokio::spawn(pipeline.run(inbound_rx, cancel.clone()));

    let poller =
        match chanrelay_telegram::start_polling(bot_config, inbound_tx, status, cancel.clone())
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "failed to connect telegram bot");
                cancel.cancel();
                let _ = pipeline_task.await;
                return Err(e.context("failed to connect telegram bot"));
            },
        };

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown requested");
        },
        () = cancel.cancelled() => {},
    }
    cancel.cancel();

    if let Err(e) = poller.await {
        warn!(error = %e, "telegram polling task ended abnormally");
    }
    let stats = pipeline_task
        .await
        .context("relay pipeline task ended abnormally")?;
    info!(
        received = stats.messages_received,
        forwarded = stats.messages_forwarded,
        "chanrelay stopped"
    );
    Ok(())
}
