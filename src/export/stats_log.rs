//! Periodic per-session transport statistics

use std::io::{self, BufWriter, Write};

use crate::session::SessionMeta;
use crate::types::StreamStats;

pub fn format_row(
    session: &SessionMeta,
    report_count: u32,
    timestamp: u64,
    stats: &StreamStats,
) -> String {
    let key = &session.key;
    let flow = &key.five_tuple;
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        timestamp,
        report_count,
        key.ssrc,
        key.media_type.as_char(),
        key.stream_type.as_char(),
        flow.src,
        flow.src_port,
        flow.dst,
        flow.dst_port,
        stats.total_pkts,
        stats.total_bytes,
        stats.lost_pkts,
        stats.duplicate_pkts,
        stats.out_of_order_pkts,
        stats.total_frames,
        stats.mean_frame_size(),
        stats.mean_jitter(),
    )
}

pub struct StatsLogWriter<W: Write> {
    out: BufWriter<W>,
}

impl<W: Write> StatsLogWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { out: BufWriter::new(writer) }
    }

    pub fn write(
        &mut self,
        session: &SessionMeta,
        report_count: u32,
        timestamp: u64,
        stats: &StreamStats,
    ) -> io::Result<()> {
        writeln!(self.out, "{}", format_row(session, report_count, timestamp, stats))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::video_session;

    #[test]
    fn row_layout() {
        let stats = StreamStats {
            total_pkts: 10,
            total_bytes: 9000,
            lost_pkts: 1,
            total_frames: 3,
            total_frame_bytes: 9000,
            ..Default::default()
        };
        let row = format_row(&video_session(77), 2, 1_700_000_001, &stats);
        assert_eq!(row, "1700000001,2,77,v,m,10.0.0.1,8801,10.0.0.2,50000,10,9000,1,0,0,3,3000,0");
    }
}
