//! Frame log: the hand-off between frame extraction and playout scoring
//!
//! One row per normalized frame, no header, 22 columns:
//!
//! ```text
//! protocol,ip_src,tp_src,ip_dst,tp_dst,ssrc,media_tag,ext,
//! min_s,min_us,max_s,max_us,rtp_ts,pkts_seen,pkts_hint,payload_len,
//! fps,jitter_ms,times,rtps,clock_diff,group_id
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use super::{CsvFields, format_ext, parse_ext, push_five_tuple};
use crate::types::{CaptureTime, FrameRecord, GroupId};
use crate::{AnalysisError, Diagnostics, Result};

/// Number of columns in a frame log row.
pub const FRAME_LOG_COLUMNS: usize = 22;

/// Format one frame log row, without line terminator.
pub fn format_row(record: &FrameRecord) -> String {
    let mut row = String::with_capacity(160);
    push_five_tuple(&mut row, &record.five_tuple);
    let _ = write!(
        row,
        ",{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        record.ssrc,
        record.media_tag,
        format_ext(&record.ext),
        record.min_time.secs,
        record.min_time.micros,
        record.max_time.secs,
        record.max_time.micros,
        record.rtp_timestamp,
        record.packets_seen,
        record.packets_hint,
        record.total_payload_len,
        record.fps,
        record.jitter_ms,
        record.times,
        record.rtps,
        record.clock_diff,
        record.group_id,
    );
    row
}

/// Parse one frame log row. `line` is 1-based and only used for reporting.
pub fn parse_row(row: &str, line: u64) -> Result<FrameRecord> {
    let mut fields = CsvFields::split(row, FRAME_LOG_COLUMNS, line)?;

    let five_tuple = fields.next_five_tuple()?;
    let ssrc = fields.next_parsed("ssrc")?;
    let media_tag = fields.next_parsed("media_tag")?;
    let ext_field = fields.next_str("ext")?;
    let ext = parse_ext(ext_field).ok_or_else(|| {
        AnalysisError::malformed(fields.line(), format!("invalid ext '{}'", ext_field))
    })?;

    Ok(FrameRecord {
        five_tuple,
        ssrc,
        media_tag,
        ext,
        min_time: CaptureTime::new(fields.next_parsed("min_s")?, fields.next_parsed("min_us")?),
        max_time: CaptureTime::new(fields.next_parsed("max_s")?, fields.next_parsed("max_us")?),
        rtp_timestamp: fields.next_parsed("rtp_ts")?,
        packets_seen: fields.next_parsed("pkts_seen")?,
        packets_hint: fields.next_parsed("pkts_hint")?,
        total_payload_len: fields.next_parsed("payload_len")?,
        fps: fields.next_parsed("fps")?,
        jitter_ms: fields.next_parsed("jitter_ms")?,
        times: fields.next_parsed("times")?,
        rtps: fields.next_parsed("rtps")?,
        clock_diff: fields.next_parsed("clock_diff")?,
        group_id: GroupId(fields.next_parsed("group_id")?),
    })
}

/// Buffered frame log writer.
pub struct FrameLogWriter<W: Write> {
    out: BufWriter<W>,
    rows: u64,
}

impl<W: Write> FrameLogWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { out: BufWriter::new(writer), rows: 0 }
    }

    pub fn write(&mut self, record: &FrameRecord) -> io::Result<()> {
        writeln!(self.out, "{}", format_row(record))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.out.into_inner().map_err(io::IntoInnerError::into_error)
    }
}

/// Streaming frame log reader.
///
/// Yields one item per non-blank line. Malformed rows come out as
/// non-fatal `MalformedRecord` errors; a read failure is yielded once as a
/// fatal `UnreadableSource` and ends iteration.
pub struct FrameLogReader<R: BufRead> {
    lines: io::Lines<R>,
    line: u64,
    source_name: String,
    done: bool,
}

impl<R: BufRead> FrameLogReader<R> {
    pub fn new(reader: R, source_name: impl Into<String>) -> Self {
        Self { lines: reader.lines(), line: 0, source_name: source_name.into(), done: false }
    }
}

impl<R: BufRead> Iterator for FrameLogReader<R> {
    type Item = Result<FrameRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.line += 1;
            match self.lines.next()? {
                Ok(row) if row.trim().is_empty() => continue,
                Ok(row) => return Some(parse_row(&row, self.line)),
                Err(e) => {
                    self.done = true;
                    return Some(Err(AnalysisError::unreadable(self.source_name.clone(), e)));
                }
            }
        }
    }
}

/// Every valid row of a frame log plus the diagnostics for the rest.
#[derive(Debug, Default)]
pub struct FrameLog {
    pub records: Vec<FrameRecord>,
    pub diagnostics: Diagnostics,
}

/// Read a whole frame log, skipping and reporting malformed rows.
pub fn read_frame_log<R: BufRead>(reader: R, source_name: &str) -> Result<FrameLog> {
    let mut log = FrameLog::default();
    for item in FrameLogReader::new(reader, source_name) {
        match item {
            Ok(record) => log.records.push(record),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => log.diagnostics.report(e),
        }
    }
    if log.records.is_empty() {
        log.diagnostics.report(AnalysisError::empty_input(source_name));
    }
    info!(
        records = log.records.len(),
        skipped = log.diagnostics.malformed_count(),
        "Loaded frame log {}",
        source_name
    );
    Ok(log)
}

/// Open and read a frame log file. An unopenable file is fatal.
pub fn load_frame_log<P: AsRef<Path>>(path: P) -> Result<FrameLog> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| AnalysisError::unreadable(path.to_path_buf(), e))?;
    read_frame_log(BufReader::new(file), &path.display().to_string())
}
