//! Per-session summary written at the end of a run

use std::io::{self, BufWriter, Write};

use crate::session::SessionState;

pub const STREAMS_LOG_HEADER: &str = "rtp_ssrc,media_type,stream_type,ip_src,tp_src,ip_dst,tp_dst,\
start_ts_s,start_ts_us,end_ts_s,end_ts_us,start_rtp_ts,end_rtp_ts,pkts,bytes";

pub fn format_row(state: &SessionState) -> String {
    let key = state.key();
    let flow = &key.five_tuple;
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        key.ssrc,
        key.media_type.as_char(),
        key.stream_type.as_char(),
        flow.src,
        flow.src_port,
        flow.dst,
        flow.dst_port,
        state.first_time().secs,
        state.first_time().micros,
        state.last_time().secs,
        state.last_time().micros,
        state.first_rtp(),
        state.last_rtp(),
        state.total_pkts(),
        state.total_bytes(),
    )
}

pub struct StreamsLogWriter<W: Write> {
    out: BufWriter<W>,
}

impl<W: Write> StreamsLogWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { out: BufWriter::new(writer) }
    }

    /// Write the header and one row per session.
    pub fn write_all<'a>(
        &mut self,
        sessions: impl IntoIterator<Item = &'a SessionState>,
    ) -> io::Result<()> {
        writeln!(self.out, "{}", STREAMS_LOG_HEADER)?;
        for state in sessions {
            writeln!(self.out, "{}", format_row(state))?;
        }
        self.out.flush()
    }
}
