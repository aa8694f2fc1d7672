use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use video_meme_analyzer::playback::ExternalPlayer;
use video_meme_analyzer::session::{analyze_once, PlayerFactory, Session};
use video_meme_analyzer::upload::UploadController;
use video_meme_analyzer::view::{Screen, ViewState};
use video_meme_analyzer::{
    AssetResolver, Config, HttpAnalysisClient, PreviewRegistry, PreviewSource, UploadStatus,
};

fn cli() -> Command {
    Command::new("AI Video Meme Analyzer")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Upload videos for meme analysis and browse the suggestions")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (TOML)")
                .global(true)
        )
        .arg(
            Arg::new("endpoint")
                .short('e')
                .long("endpoint")
                .value_name("URL")
                .help("Base URL of the analysis service")
                .global(true)
        )
        .arg(
            Arg::new("assets-root")
                .long("assets-root")
                .value_name("PATH")
                .help("Path segment meme images are served under")
                .global(true)
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Upload timeout in seconds (0 = none)")
                .value_parser(clap::value_parser!(u64))
                .global(true)
        )
        .arg(
            Arg::new("player")
                .long("player")
                .value_name("COMMAND")
                .help("External video player executable")
                .global(true)
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true)
        )
        .subcommand(
            Command::new("analyze")
                .about("Analyze one video and print the suggestions")
                .arg(Arg::new("file").value_name("FILE").required(true))
        )
        .subcommand(
            Command::new("fetch")
                .about("Show a stored analysis by its result ID")
                .arg(Arg::new("file-id").value_name("FILE_ID").required(true))
        )
        .subcommand(Command::new("health").about("Check that the analysis service is up"))
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?.with_env_overrides(),
        None => Config::load()?,
    };

    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config.service.endpoint = endpoint.clone();
    }
    if let Some(root) = matches.get_one::<String>("assets-root") {
        config.assets.assets_root = root.clone();
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.service.timeout_seconds = *timeout;
    }
    if let Some(player) = matches.get_one::<String>("player") {
        config.player.command = player.clone();
    }
    if matches.get_flag("verbose") {
        config.output.log_level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Log filter for this crate's targets at `level`; everything else at warn
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("video_meme_analyzer={},meme_analyzer={},warn", level, level))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    // Start logging before the config is read so its diagnostics are not
    // lost; the configured level is applied once it is known
    let initial_level = if matches.get_flag("verbose") { "debug" } else { "info" };
    let (filter, filter_handle) = reload::Layer::new(log_filter(initial_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&matches)?;
    filter_handle.reload(log_filter(&config.output.log_level))?;

    info!("🚀 Meme analyzer starting...");
    match matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .or_else(Config::locate)
    {
        Some(path) => info!("📄 Loaded configuration from: {}", path.display()),
        None => info!("📄 No config file found, using defaults and environment"),
    }
    info!("🔗 Analysis service: {}", config.service.endpoint);
    debug!("{}", config.summary());

    let client = HttpAnalysisClient::new(config.service.clone())?;
    let assets = AssetResolver::from_config(&config.assets);
    let mut stdout = std::io::stdout();

    match matches.subcommand() {
        Some(("analyze", sub)) => {
            let file = sub
                .get_one::<String>("file")
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("missing FILE argument"))?;

            let status = analyze_once(&client, &assets, &file, &mut stdout).await?;
            if status != UploadStatus::Succeeded {
                error!("❌ Analysis of {} failed", file.display());
                return Err(anyhow!("analysis of {} failed", file.display()));
            }
        }
        Some(("fetch", sub)) => {
            let file_id = sub
                .get_one::<String>("file-id")
                .ok_or_else(|| anyhow!("missing FILE_ID argument"))?;

            let result = client.fetch_result(file_id).await?;
            let mut controller = UploadController::default();
            controller.show_result(result);
            print!("{}", Screen::new(ViewState::of(&controller), &assets));
        }
        Some(("health", _)) => {
            let health = client.health().await?;
            println!(
                "{} {}",
                health.status,
                health.timestamp.as_deref().unwrap_or_default()
            );
            if !health.is_healthy() {
                return Err(anyhow!("analysis service reports status '{}'", health.status));
            }
        }
        _ => {
            let player_config = config.player.clone();
            let player_factory: PlayerFactory =
                Box::new(move |previews: &PreviewRegistry, preview: &PreviewSource| {
                    ExternalPlayer::mount(&player_config, previews, preview)
                });

            let mut session = Session::new(Arc::new(client), assets, player_factory);
            let stdin = BufReader::new(tokio::io::stdin());
            session.run(stdin, &mut stdout).await?;
            info!("👋 Session ended");
        }
    }

    Ok(())
}
