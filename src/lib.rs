//! Offline RTP playout analysis.
//!
//! rtp-playout estimates how a receiver's jitter buffer would have played a
//! captured RTP video stream. It works in two stages:
//!
//! - **Frame extraction** ([`OfflineAnalyzer`]): packets are demultiplexed
//!   into sessions, reassembled into frames and normalized onto a common
//!   clock per group. Each frame becomes one [`FrameRecord`] row of the
//!   frame log.
//! - **Playout scoring** ([`playout`]): frame rows are grouped, replayed
//!   against a virtual playout clock and summarized as lateness ratios,
//!   skips and freezes.
//!
//! The frame log is the only hand-off between the two stages, so scoring can
//! run on a log written by an earlier extraction.
//!
//! # Quick Start
//!
//! ```rust
//! use rtp_playout::{AnalyzerConfig, OfflineAnalyzer};
//! use rtp_playout::playout::{group_records, score_groups};
//!
//! # fn main() -> rtp_playout::Result<()> {
//! let mut analyzer = OfflineAnalyzer::new(AnalyzerConfig::default())?;
//! # let packets: Vec<rtp_playout::PacketRecord> = Vec::new();
//! for packet in &packets {
//!     analyzer.add(packet);
//! }
//! let report = analyzer.finish()?;
//!
//! let summary = score_groups(&group_records(report.records));
//! println!("{} lateness ratios", summary.lateness_ratios.len());
//! # Ok(())
//! # }
//! ```

// Core types and error handling
pub mod config;
mod diagnostics;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Stage (a): sessions, frames, normalization
pub mod analyzer;
pub mod normalize;
pub mod session;

// Log formats shared by both stages
pub mod export;

// Stage (b): grouping and scoring
pub mod playout;

// Core exports
pub use analyzer::{AnalysisReport, OfflineAnalyzer};
pub use config::{AnalyzerConfig, NormalizationConfig};
pub use diagnostics::Diagnostics;
pub use error::*;
pub use types::*;
