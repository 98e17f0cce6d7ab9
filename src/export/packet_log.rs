//! Packet log
//!
//! One row per ingested packet after a header line. The same format is read
//! back by [`PacketLogReader`], which makes the log the packet source of the
//! command-line tool.

use std::fmt::Write as _;
use std::io::{self, BufRead, BufWriter, Write};

use super::{CsvFields, format_ext, parse_ext, push_five_tuple};
use crate::types::{CaptureTime, PacketRecord, StreamType};
use crate::{AnalysisError, Result};

pub const PACKET_LOG_HEADER: &str = "ts_s,ts_us,protocol,ip_src,tp_src,ip_dst,tp_dst,ssrc,\
media_tag,stream_type,payload_type,seq,rtp_ts,payload_len,ext,pkts_hint";

const PACKET_LOG_COLUMNS: usize = 16;

/// Marker for an absent optional column.
const NOT_AVAILABLE: &str = "NA";

pub fn format_row(packet: &PacketRecord) -> String {
    let mut row = String::with_capacity(128);
    let _ = write!(row, "{},{},", packet.captured.secs, packet.captured.micros);
    push_five_tuple(&mut row, &packet.five_tuple);
    let ext = if packet.ext == [0; 3] { NOT_AVAILABLE.to_string() } else { format_ext(&packet.ext) };
    let hint = packet.packets_hint.map_or_else(|| NOT_AVAILABLE.to_string(), |h| h.to_string());
    let _ = write!(
        row,
        ",{},{},{},{},{},{},{},{},{}",
        packet.ssrc,
        packet.media_tag,
        packet.stream_type.as_char(),
        packet.payload_type,
        packet.sequence,
        packet.rtp_timestamp,
        packet.payload_len,
        ext,
        hint,
    );
    row
}

pub fn parse_row(row: &str, line: u64) -> Result<PacketRecord> {
    let mut fields = CsvFields::split(row, PACKET_LOG_COLUMNS, line)?;

    let captured = CaptureTime::new(fields.next_parsed("ts_s")?, fields.next_parsed("ts_us")?);
    let five_tuple = fields.next_five_tuple()?;
    let ssrc = fields.next_parsed("ssrc")?;
    let media_tag = fields.next_parsed("media_tag")?;
    let stream_field = fields.next_str("stream_type")?;
    let stream_type = stream_field
        .chars()
        .next()
        .filter(|_| stream_field.len() == 1)
        .and_then(StreamType::from_char)
        .ok_or_else(|| {
            AnalysisError::malformed(line, format!("invalid stream_type '{}'", stream_field))
        })?;
    let payload_type = fields.next_parsed("payload_type")?;
    let sequence = fields.next_parsed("seq")?;
    let rtp_timestamp = fields.next_parsed("rtp_ts")?;
    let payload_len = fields.next_parsed("payload_len")?;

    let ext_field = fields.next_str("ext")?;
    let ext = if ext_field == NOT_AVAILABLE {
        [0; 3]
    } else {
        parse_ext(ext_field)
            .ok_or_else(|| AnalysisError::malformed(line, format!("invalid ext '{}'", ext_field)))?
    };

    let hint_field = fields.next_str("pkts_hint")?;
    let packets_hint = if hint_field == NOT_AVAILABLE {
        None
    } else {
        Some(hint_field.parse().map_err(|_| {
            AnalysisError::malformed(line, format!("invalid pkts_hint '{}'", hint_field))
        })?)
    };

    Ok(PacketRecord {
        captured,
        five_tuple,
        ssrc,
        media_tag,
        stream_type,
        payload_type,
        sequence,
        rtp_timestamp,
        payload_len,
        ext,
        packets_hint,
    })
}

pub struct PacketLogWriter<W: Write> {
    out: BufWriter<W>,
}

impl<W: Write> PacketLogWriter<W> {
    /// Create the writer and emit the header line.
    pub fn new(writer: W) -> io::Result<Self> {
        let mut out = BufWriter::new(writer);
        writeln!(out, "{}", PACKET_LOG_HEADER)?;
        Ok(Self { out })
    }

    pub fn write(&mut self, packet: &PacketRecord) -> io::Result<()> {
        writeln!(self.out, "{}", format_row(packet))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.out.into_inner().map_err(io::IntoInnerError::into_error)
    }
}

/// Streaming packet log reader; see [`FrameLogReader`](super::FrameLogReader)
/// for the error contract. A leading header line is skipped.
pub struct PacketLogReader<R: BufRead> {
    lines: io::Lines<R>,
    line: u64,
    source_name: String,
    done: bool,
}

impl<R: BufRead> PacketLogReader<R> {
    pub fn new(reader: R, source_name: impl Into<String>) -> Self {
        Self { lines: reader.lines(), line: 0, source_name: source_name.into(), done: false }
    }
}

impl<R: BufRead> Iterator for PacketLogReader<R> {
    type Item = Result<PacketRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.line += 1;
            match self.lines.next()? {
                Ok(row) if row.trim().is_empty() => continue,
                Ok(row) if self.line == 1 && row.starts_with("ts_s,") => continue,
                Ok(row) => return Some(parse_row(&row, self.line)),
                Err(e) => {
                    self.done = true;
                    return Some(Err(AnalysisError::unreadable(self.source_name.clone(), e)));
                }
            }
        }
    }
}
