//! Command-line driver for the two analysis stages.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rtp_playout::export::PacketLogReader;
use rtp_playout::playout::{group_records, score_groups, score_groups_parallel};
use rtp_playout::{AnalysisError, AnalyzerConfig, OfflineAnalyzer, export};

#[derive(Parser)]
#[command(name = "rtp-playout")]
#[command(version)]
#[command(about = "Offline RTP frame extraction and playout scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract normalized frames from a packet log
    Frames {
        /// Packet log to read
        #[arg(long)]
        packets: PathBuf,
        /// Frame log to write
        #[arg(long)]
        frames: PathBuf,
        /// Per-session summary to write
        #[arg(long)]
        streams: Option<PathBuf>,
        /// Periodic statistics log to write
        #[arg(long)]
        stats: Option<PathBuf>,
        /// Copy of every ingested packet
        #[arg(long)]
        packet_log: Option<PathBuf>,
        /// YAML analyzer configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Score a frame log and write the result lists
    Score {
        /// Frame log to read
        #[arg(long)]
        frames: PathBuf,
        /// Directory for the result lists
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Score groups on a thread pool
        #[arg(long)]
        parallel: bool,
    },
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("creating {}", path.display()))
}

fn run_frames(
    packets: &Path,
    frames: &Path,
    streams: Option<&Path>,
    stats: Option<&Path>,
    packet_log: Option<&Path>,
    config: Option<&Path>,
) -> Result<()> {
    let config = match config {
        Some(path) => AnalyzerConfig::from_path(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };

    let mut analyzer = OfflineAnalyzer::new(config)?.with_frame_log(create(frames)?);
    if let Some(path) = streams {
        analyzer = analyzer.with_streams_log(create(path)?);
    }
    if let Some(path) = stats {
        analyzer = analyzer.with_stats_log(create(path)?);
    }
    if let Some(path) = packet_log {
        analyzer = analyzer.with_packet_log(create(path)?)?;
    }

    let input = File::open(packets).with_context(|| format!("opening {}", packets.display()))?;
    let reader = PacketLogReader::new(BufReader::new(input), packets.display().to_string());
    for item in reader {
        match item {
            Ok(packet) => analyzer.add(&packet),
            Err(e) if e.is_fatal() => return Err(e).context("reading packet log"),
            Err(e) => analyzer.report(e),
        }
    }

    let report = analyzer.finish().context("finishing frame extraction")?;
    if !report.diagnostics.is_empty() {
        warn!(count = report.diagnostics.len(), "Frame extraction reported problems");
    }
    info!(
        frames = report.records.len(),
        groups = report.groups,
        "Wrote frame log {}",
        frames.display()
    );
    Ok(())
}

async fn run_score(frames: &Path, out_dir: &Path, parallel: bool) -> Result<()> {
    let log = export::load_frame_log(frames)?;
    let groups = group_records(log.records);

    let summary = if parallel {
        score_groups_parallel(groups).await?
    } else {
        score_groups(&groups)
    };
    summary.write_lists(out_dir)?;

    println!(
        "groups: {}  ratios: {}  frames: {}  skipped rows: {}",
        summary.groups.len(),
        summary.lateness_ratios.len(),
        summary.freezes.len(),
        log.diagnostics.malformed_count()
    );
    Ok(())
}

/// Recovery hints for the first analysis error in `err`'s cause chain.
fn recovery_hints(err: &anyhow::Error) -> Vec<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AnalysisError>())
        .map(AnalysisError::recovery_suggestions)
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Frames { packets, frames, streams, stats, packet_log, config } => run_frames(
            &packets,
            &frames,
            streams.as_deref(),
            stats.as_deref(),
            packet_log.as_deref(),
            config.as_deref(),
        ),
        Command::Score { frames, out_dir, parallel } => run_score(&frames, &out_dir, parallel).await,
    };

    if let Err(e) = &result {
        for hint in recovery_hints(e) {
            error!("hint: {hint}");
        }
    }
    result
}
