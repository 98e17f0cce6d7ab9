//! Stage (a) run context.
//!
//! An [`OfflineAnalyzer`] owns everything one capture analysis needs: the
//! session registry, the clock normalizer and the optional log writers. Feed
//! it packets in capture order with [`OfflineAnalyzer::add`], then call
//! [`OfflineAnalyzer::finish`].
//!
//! ```rust
//! use rtp_playout::{AnalyzerConfig, OfflineAnalyzer};
//!
//! let analyzer = OfflineAnalyzer::new(AnalyzerConfig::default())?;
//! let report = analyzer.finish()?;
//! assert_eq!(report.packets_processed, 0);
//! assert!(report.diagnostics.saw_empty_input());
//! # Ok::<(), rtp_playout::AnalysisError>(())
//! ```

use std::io::{self, Write};

use tracing::{error, info};

use crate::config::AnalyzerConfig;
use crate::export::{FrameLogWriter, PacketLogWriter, StatsLogWriter, StreamsLogWriter};
use crate::normalize::ClockNormalizer;
use crate::session::{
    AccumulatorFactory, FrameSink, RtpAccumulatorFactory, SessionMeta, SessionRegistry,
};
use crate::types::{CompletedFrame, FrameRecord, PacketRecord, StreamStats};
use crate::{AnalysisError, Diagnostics, Result};

/// Boxed output target for the analyzer's logs.
pub type OutputSink = Box<dyn Write + Send>;

/// Receives accumulator callbacks: normalizes frames and writes logs.
struct AnalyzerSink {
    normalizer: ClockNormalizer,
    frame_log: Option<FrameLogWriter<OutputSink>>,
    stats_log: Option<StatsLogWriter<OutputSink>>,
    records: Vec<FrameRecord>,
    frames_seen: u64,
    /// First write failure; later ones are dropped
    output_error: Option<AnalysisError>,
}

impl AnalyzerSink {
    fn fail(&mut self, context: &str, err: io::Error) {
        if self.output_error.is_none() {
            error!("Failed writing {}: {}", context, err);
            self.output_error = Some(AnalysisError::output(context, err));
        }
    }
}

impl FrameSink for AnalyzerSink {
    fn on_frame(&mut self, session: &SessionMeta, frame: &CompletedFrame) {
        self.frames_seen += 1;
        let Some(record) = self.normalizer.normalize(session, frame) else {
            return;
        };
        if let Some(log) = self.frame_log.as_mut() {
            if let Err(e) = log.write(&record) {
                self.fail("frame log", e);
            }
        }
        self.records.push(record);
    }

    fn on_stats(
        &mut self,
        session: &SessionMeta,
        report_count: u32,
        timestamp: u64,
        stats: &StreamStats,
    ) {
        if let Some(log) = self.stats_log.as_mut() {
            if let Err(e) = log.write(session, report_count, timestamp, stats) {
                self.fail("stats log", e);
            }
        }
    }
}

/// Result of a finished stage (a) run.
#[derive(Debug)]
pub struct AnalysisReport {
    /// Normalized frames in emission order
    pub records: Vec<FrameRecord>,
    pub diagnostics: Diagnostics,
    pub packets_processed: u64,
    /// Packets dropped because their session could not be set up
    pub packets_dropped: u64,
    pub sessions: usize,
    pub groups: usize,
    /// Frames completed by accumulators, including ones not normalized
    pub frames_seen: u64,
}

/// Run context for frame extraction and clock normalization.
pub struct OfflineAnalyzer {
    config: AnalyzerConfig,
    sessions: SessionRegistry,
    sink: AnalyzerSink,
    packet_log: Option<PacketLogWriter<OutputSink>>,
    streams_log: Option<OutputSink>,
    packets_processed: u64,
    packets_dropped: u64,
    diagnostics: Diagnostics,
}

impl OfflineAnalyzer {
    /// Create an analyzer using the stock RTP frame accumulator.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let factory = RtpAccumulatorFactory { stats_interval_secs: config.stats_interval_secs };
        Ok(Self {
            sessions: SessionRegistry::new(config.clone(), Box::new(factory)),
            sink: AnalyzerSink {
                normalizer: ClockNormalizer::new(config.normalization.clone()),
                frame_log: None,
                stats_log: None,
                records: Vec::new(),
                frames_seen: 0,
                output_error: None,
            },
            config,
            packet_log: None,
            streams_log: None,
            packets_processed: 0,
            packets_dropped: 0,
            diagnostics: Diagnostics::new(),
        })
    }

    /// Replace the accumulator factory. Must be called before any packet.
    pub fn with_accumulator_factory(mut self, factory: impl AccumulatorFactory + 'static) -> Self {
        self.sessions = SessionRegistry::new(self.config.clone(), Box::new(factory));
        self
    }

    pub fn with_frame_log(mut self, writer: impl Write + Send + 'static) -> Self {
        self.sink.frame_log = Some(FrameLogWriter::new(Box::new(writer) as OutputSink));
        self
    }

    pub fn with_stats_log(mut self, writer: impl Write + Send + 'static) -> Self {
        self.sink.stats_log = Some(StatsLogWriter::new(Box::new(writer) as OutputSink));
        self
    }

    /// The streams summary is written once, from [`finish`](Self::finish).
    pub fn with_streams_log(mut self, writer: impl Write + Send + 'static) -> Self {
        self.streams_log = Some(Box::new(writer));
        self
    }

    /// Writes the packet log header immediately.
    pub fn with_packet_log(mut self, writer: impl Write + Send + 'static) -> Result<Self> {
        let log = PacketLogWriter::new(Box::new(writer) as OutputSink)
            .map_err(|e| AnalysisError::output("packet log", e))?;
        self.packet_log = Some(log);
        Ok(self)
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Frames normalized so far.
    pub fn records(&self) -> &[FrameRecord] {
        &self.sink.records
    }

    /// Ingest one packet.
    ///
    /// A packet whose session cannot be set up is dropped and reported; it
    /// never stops the run.
    pub fn add(&mut self, packet: &PacketRecord) {
        self.packets_processed += 1;

        if let Some(log) = self.packet_log.as_mut() {
            if let Err(e) = log.write(packet) {
                self.sink.fail("packet log", e);
            }
        }

        let key = self.sessions.key_for(packet);
        match self.sessions.ensure_session(key, packet) {
            Ok(state) => state.ingest(packet, &mut self.sink),
            Err(e) => {
                self.packets_dropped += 1;
                self.diagnostics.report(e);
            }
        }
    }

    /// Record a diagnostic raised outside the analyzer, such as a malformed
    /// row from the packet source.
    pub fn report(&mut self, error: AnalysisError) {
        self.diagnostics.report(error);
    }

    /// Flush all sessions and outputs.
    ///
    /// Fails only on an output error, including one hit earlier in the run.
    pub fn finish(mut self) -> Result<AnalysisReport> {
        self.sessions.finish_all(&mut self.sink);

        if let Some(writer) = self.streams_log.take() {
            StreamsLogWriter::new(writer)
                .write_all(self.sessions.iter())
                .map_err(|e| AnalysisError::output("streams log", e))?;
        }

        if let Some(mut log) = self.packet_log.take() {
            if let Err(e) = log.flush() {
                self.sink.fail("packet log", e);
            }
        }
        if let Some(mut log) = self.sink.frame_log.take() {
            if let Err(e) = log.flush() {
                self.sink.fail("frame log", e);
            }
        }
        if let Some(mut log) = self.sink.stats_log.take() {
            if let Err(e) = log.flush() {
                self.sink.fail("stats log", e);
            }
        }
        if let Some(err) = self.sink.output_error.take() {
            return Err(err);
        }

        if self.sink.records.is_empty() {
            self.diagnostics.report(AnalysisError::empty_input("packet stream"));
        }

        let report = AnalysisReport {
            records: self.sink.records,
            diagnostics: self.diagnostics,
            packets_processed: self.packets_processed,
            packets_dropped: self.packets_dropped,
            sessions: self.sessions.len(),
            groups: self.sink.normalizer.groups().len(),
            frames_seen: self.sink.frames_seen,
        };
        info!(
            packets = report.packets_processed,
            dropped = report.packets_dropped,
            sessions = report.sessions,
            groups = report.groups,
            frames = report.records.len(),
            "Frame extraction finished"
        );
        Ok(report)
    }
}
