//! Row-oriented CSV logs.
//!
//! | Log            | Header | Written                         | Read back |
//! |----------------|--------|---------------------------------|-----------|
//! | frame log      | no     | once per normalized frame       | yes       |
//! | packet log     | yes    | once per ingested packet        | yes       |
//! | streams log    | yes    | once per session at end of run  | no        |
//! | stats log      | no     | on each accumulator report      | no        |
//!
//! Readers never fail on a bad row: the row is reported as a
//! [`AnalysisError::MalformedRecord`](crate::AnalysisError) with its line
//! number and reading continues.

pub mod frame_log;
pub mod packet_log;
pub mod stats_log;
pub mod streams_log;

pub use frame_log::{FrameLog, FrameLogReader, FrameLogWriter, load_frame_log};
pub use packet_log::{PacketLogReader, PacketLogWriter};
pub use stats_log::StatsLogWriter;
pub use streams_log::StreamsLogWriter;

use std::fmt::Write as _;
use std::str::FromStr;

use crate::types::FiveTuple;
use crate::{AnalysisError, Result};

/// Append `protocol,ip_src,tp_src,ip_dst,tp_dst`.
pub(crate) fn push_five_tuple(row: &mut String, five_tuple: &FiveTuple) {
    let _ = write!(
        row,
        "{},{},{},{},{}",
        five_tuple.protocol,
        five_tuple.src,
        five_tuple.src_port,
        five_tuple.dst,
        five_tuple.dst_port
    );
}

/// Extension bytes as six lowercase hex digits.
pub(crate) fn format_ext(ext: &[u8; 3]) -> String {
    format!("{:02x}{:02x}{:02x}", ext[0], ext[1], ext[2])
}

pub(crate) fn parse_ext(field: &str) -> Option<[u8; 3]> {
    let digits = field.strip_prefix("0x").unwrap_or(field);
    if digits.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    let [_, a, b, c] = value.to_be_bytes();
    Some([a, b, c])
}

/// Positional field access over one CSV row with line-aware errors.
pub(crate) struct CsvFields<'a> {
    fields: Vec<&'a str>,
    next: usize,
    line: u64,
}

impl<'a> CsvFields<'a> {
    /// Split `row`, requiring exactly `expected` columns.
    pub(crate) fn split(row: &'a str, expected: usize, line: u64) -> Result<Self> {
        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        if fields.len() != expected {
            return Err(AnalysisError::malformed(
                line,
                format!("expected {} fields, found {}", expected, fields.len()),
            ));
        }
        Ok(Self { fields, next: 0, line })
    }

    pub(crate) fn next_str(&mut self, name: &str) -> Result<&'a str> {
        let field = self.fields.get(self.next).copied().ok_or_else(|| {
            AnalysisError::malformed(self.line, format!("missing field '{}'", name))
        })?;
        self.next += 1;
        Ok(field)
    }

    pub(crate) fn next_parsed<T: FromStr>(&mut self, name: &str) -> Result<T> {
        let line = self.line;
        let field = self.next_str(name)?;
        field.parse().map_err(|_| {
            AnalysisError::malformed(line, format!("invalid {} '{}'", name, field))
        })
    }

    pub(crate) fn next_five_tuple(&mut self) -> Result<FiveTuple> {
        Ok(FiveTuple {
            protocol: self.next_parsed("protocol")?,
            src: self.next_parsed("ip_src")?,
            src_port: self.next_parsed("tp_src")?,
            dst: self.next_parsed("ip_dst")?,
            dst_port: self.next_parsed("tp_dst")?,
        })
    }

    pub(crate) fn line(&self) -> u64 {
        self.line
    }
}
