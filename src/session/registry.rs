//! Session registry
//!
//! Maps each [`SessionKey`] to the [`SessionState`] created for it on the
//! first matching packet. Sessions are never removed during a run.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use super::{AccumulatorFactory, FrameAccumulator, FrameSink, SessionMeta};
use crate::config::AnalyzerConfig;
use crate::types::{CaptureTime, PacketRecord, SessionKey, StreamStats};
use crate::{AnalysisError, Result};

/// Everything known about one session.
pub struct SessionState {
    meta: SessionMeta,
    first_time: CaptureTime,
    last_time: CaptureTime,
    first_rtp: u32,
    last_rtp: u32,
    total_pkts: u64,
    total_bytes: u64,
    accumulator: Box<dyn FrameAccumulator>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("meta", &self.meta)
            .field("first_time", &self.first_time)
            .field("last_time", &self.last_time)
            .field("first_rtp", &self.first_rtp)
            .field("last_rtp", &self.last_rtp)
            .field("total_pkts", &self.total_pkts)
            .field("total_bytes", &self.total_bytes)
            .finish_non_exhaustive()
    }
}

impl SessionState {
    fn new(
        meta: SessionMeta,
        packet: &PacketRecord,
        accumulator: Box<dyn FrameAccumulator>,
    ) -> Self {
        Self {
            meta,
            first_time: packet.captured,
            last_time: packet.captured,
            first_rtp: packet.rtp_timestamp,
            last_rtp: packet.rtp_timestamp,
            total_pkts: 0,
            total_bytes: 0,
            accumulator,
        }
    }

    /// Update session counters and hand the packet to the accumulator.
    pub fn ingest(&mut self, packet: &PacketRecord, sink: &mut dyn FrameSink) {
        self.last_time = packet.captured;
        self.last_rtp = packet.rtp_timestamp;
        self.total_pkts += 1;
        self.total_bytes += u64::from(packet.payload_len);

        self.accumulator.add(&self.meta, packet, sink);
    }

    /// Flush the accumulator at end of input.
    pub fn finish(&mut self, sink: &mut dyn FrameSink) {
        self.accumulator.finish(&self.meta, sink);
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn key(&self) -> &SessionKey {
        &self.meta.key
    }

    pub fn sampling_rate(&self) -> u32 {
        self.meta.sampling_rate
    }

    pub fn first_time(&self) -> CaptureTime {
        self.first_time
    }

    pub fn last_time(&self) -> CaptureTime {
        self.last_time
    }

    pub fn first_rtp(&self) -> u32 {
        self.first_rtp
    }

    pub fn last_rtp(&self) -> u32 {
        self.last_rtp
    }

    pub fn total_pkts(&self) -> u64 {
        self.total_pkts
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn stats(&self) -> &StreamStats {
        self.accumulator.stats()
    }
}

/// Owner of all session state for one run.
pub struct SessionRegistry {
    config: AnalyzerConfig,
    factory: Box<dyn AccumulatorFactory>,
    sessions: HashMap<SessionKey, SessionState>,
    /// Keys in creation order, for deterministic summaries
    order: Vec<SessionKey>,
}

impl SessionRegistry {
    pub fn new(config: AnalyzerConfig, factory: Box<dyn AccumulatorFactory>) -> Self {
        Self { config, factory, sessions: HashMap::new(), order: Vec::new() }
    }

    /// Session key a packet belongs to.
    pub fn key_for(&self, packet: &PacketRecord) -> SessionKey {
        SessionKey {
            five_tuple: packet.five_tuple,
            ssrc: packet.ssrc,
            media_type: self.config.media_type(packet.media_tag),
            stream_type: packet.stream_type,
        }
    }

    /// Look up the session for `key`, creating it from `packet` when absent.
    pub fn ensure_session(
        &mut self,
        key: SessionKey,
        packet: &PacketRecord,
    ) -> Result<&mut SessionState> {
        match self.sessions.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let meta =
                    SessionMeta { key, sampling_rate: self.config.sampling_rate(key.media_type) };
                let accumulator = self
                    .factory
                    .create(&meta)
                    .map_err(|e| AnalysisError::session_setup(key.to_string(), e.to_string()))?;

                debug!(session = %key, sampling_rate = meta.sampling_rate, "New session");
                self.order.push(key);
                Ok(entry.insert(SessionState::new(meta, packet, accumulator)))
            }
        }
    }

    pub fn get(&self, key: &SessionKey) -> Option<&SessionState> {
        self.sessions.get(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &SessionState> {
        self.order.iter().filter_map(|key| self.sessions.get(key))
    }

    /// Flush every session's accumulator, in creation order.
    pub fn finish_all(&mut self, sink: &mut dyn FrameSink) {
        for key in &self.order {
            if let Some(state) = self.sessions.get_mut(key) {
                state.finish(sink);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RtpAccumulatorFactory;
    use crate::test_utils::{RecordingSink, audio_packet, video_packet};
    use crate::types::{MediaType, StreamType};

    fn registry() -> SessionRegistry {
        let config = AnalyzerConfig::default();
        SessionRegistry::new(config, Box::new(RtpAccumulatorFactory { stats_interval_secs: 1 }))
    }

    #[test]
    fn sampling_rate_is_chosen_from_media_type() -> anyhow::Result<()> {
        let mut registry = registry();

        let audio = audio_packet(1, 160, 1_000);
        let key = registry.key_for(&audio);
        assert_eq!(key.media_type, MediaType::Audio);
        assert_eq!(registry.ensure_session(key, &audio)?.sampling_rate(), 8000);

        let video = video_packet(1, 3000, 1_000);
        let key = registry.key_for(&video);
        assert_eq!(key.media_type, MediaType::Video);
        assert_eq!(registry.ensure_session(key, &video)?.sampling_rate(), 90_000);

        assert_eq!(registry.len(), 2);
        Ok(())
    }

    #[test]
    fn sessions_are_created_once_and_track_totals() -> anyhow::Result<()> {
        let mut registry = registry();
        let mut sink = RecordingSink::default();

        for (seq, ts, ms) in [(1u16, 3000u32, 1_000u64), (2, 3000, 1_010), (3, 6000, 1_040)] {
            let packet = video_packet(seq, ts, ms);
            let key = registry.key_for(&packet);
            registry.ensure_session(key, &packet)?.ingest(&packet, &mut sink);
        }

        assert_eq!(registry.len(), 1);
        let state = registry.iter().next().expect("one session");
        assert_eq!(state.total_pkts(), 3);
        assert_eq!(state.total_bytes(), 3000);
        assert_eq!(state.first_time().as_millis(), 1_000);
        assert_eq!(state.last_time().as_millis(), 1_040);
        assert_eq!(state.first_rtp(), 3000);
        assert_eq!(state.last_rtp(), 6000);
        assert_eq!(state.stats().total_pkts, 3);
        Ok(())
    }

    #[test]
    fn fec_stream_is_a_separate_session() -> anyhow::Result<()> {
        let mut registry = registry();

        let media = video_packet(1, 3000, 1_000);
        let fec = PacketRecord { stream_type: StreamType::Fec, ..media.clone() };

        let media_key = registry.key_for(&media);
        registry.ensure_session(media_key, &media)?;
        let fec_key = registry.key_for(&fec);
        registry.ensure_session(fec_key, &fec)?;

        assert_eq!(registry.len(), 2);
        assert_eq!(media_key.group_key(), fec_key.group_key());
        Ok(())
    }

    #[test]
    fn factory_failure_is_session_setup_error() {
        let failing = |_: &SessionMeta| -> Result<Box<dyn FrameAccumulator>> {
            Err(AnalysisError::config("no accumulator for this media"))
        };
        let mut registry = SessionRegistry::new(AnalyzerConfig::default(), Box::new(failing));

        let packet = video_packet(1, 3000, 1_000);
        let key = registry.key_for(&packet);
        let result = registry.ensure_session(key, &packet);

        assert!(matches!(result, Err(AnalysisError::SessionSetup { .. })));
        assert!(registry.is_empty());
    }
}
