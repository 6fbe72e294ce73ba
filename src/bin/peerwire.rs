use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use peerwire::config::{ClientConfig, LoggingConfig};
use peerwire::metainfo::Metainfo;
use peerwire::peer::PeerId;
use peerwire::storage::PieceWriter;
use peerwire::swarm::{connect_peers, Swarm};
use peerwire::tracker::{HttpTracker, TrackerEvent};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(version, about)]
struct Opts {
    /// The .torrent file to download.
    torrent: PathBuf,

    /// Directory the payload file is written into.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(short, long, env = "PEERWIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Port reported to the tracker.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long)]
    debug: bool,
}

fn init_tracing(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true),
            )
            .init();
    }
}

fn load_config(opts: &Opts) -> Result<ClientConfig> {
    let mut config = match &opts.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("error loading config from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if let Some(output) = &opts.output {
        config.output_dir = output.clone();
    }
    if let Some(port) = opts.port {
        config.port = port;
    }
    if opts.debug {
        config.logging.level = "debug".to_string();
    }
    Ok(config)
}

/// Joins the torrent's suggested name onto `dir`, keeping only its last
/// component.
fn output_path(dir: &Path, name: &str) -> Result<PathBuf> {
    match Path::new(name).file_name() {
        Some(file_name) => Ok(dir.join(file_name)),
        None => bail!("torrent name {:?} is not a usable file name", name),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();
    let config = load_config(&opts)?;
    init_tracing(&config.logging);

    let torrent = Metainfo::from_file(&opts.torrent)
        .with_context(|| format!("error reading torrent {}", opts.torrent.display()))?;
    let info = &torrent.info;
    info!(
        name = %info.name,
        info_hash = %torrent.info_hash,
        pieces = info.piece_count(),
        piece_length = info.piece_length,
        total_length = info.total_length,
        "loaded torrent"
    );

    let announce = torrent
        .trackers()
        .into_iter()
        .find(|url| url.starts_with("http://") || url.starts_with("https://"))
        .context("torrent has no HTTP tracker")?;

    let peer_id = PeerId::generate();
    let tracker = HttpTracker::new(&announce)
        .with_context(|| format!("invalid tracker url {}", announce))?;
    let response = tracker
        .announce(
            torrent.info_hash.as_bytes(),
            peer_id.as_bytes(),
            config.port,
            0,
            info.total_length,
            TrackerEvent::Started,
        )
        .await
        .with_context(|| format!("error announcing to {}", announce))?;

    if let Some(warning) = &response.warning_message {
        warn!("tracker warning: {}", warning);
    }
    let mut peers = response.peers;
    if peers.is_empty() {
        bail!("tracker returned no peers");
    }
    if peers.len() > config.max_peers {
        debug!("using {} of {} peers", config.max_peers, peers.len());
        peers.truncate(config.max_peers);
    }

    let path = output_path(&config.output_dir, &info.name)?;
    let (writer, reports) = PieceWriter::open(&path, info.piece_length, info.total_length)
        .await
        .with_context(|| format!("error opening {}", path.display()))?;

    let (events_tx, events_rx) = mpsc::channel(config.event_capacity);
    let params = config.session_params(torrent.info_hash, peer_id, info.piece_length);
    let spawned = connect_peers(peers, params, events_tx);
    info!("connecting to {} peers as {}", spawned, peer_id);

    let swarm = Swarm::new(events_rx, writer, reports, config.swarm_options());
    let outcome = swarm
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("error waiting for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            info!("interrupted, shutting down");
        })
        .await;

    for e in &outcome.errors {
        warn!("{}", e);
    }
    info!(
        "{}/{} pieces written to {}",
        outcome.pieces_written,
        outcome.piece_count,
        path.display()
    );

    if !outcome.completed {
        bail!(
            "download incomplete: {}/{} pieces",
            outcome.pieces_written,
            outcome.piece_count
        );
    }
    Ok(())
}
