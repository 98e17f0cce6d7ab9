//! Stage (b): grouping and playout scoring of frame log rows.
//!
//! ```rust
//! use rtp_playout::playout::{group_records, score_groups};
//!
//! let summary = score_groups(&group_records(Vec::new()));
//! assert!(summary.lateness_ratios.is_empty());
//! ```

pub mod aggregate;
pub mod grouper;
pub mod simulator;

pub use aggregate::{
    FREEZE_LIST_FILE, GroupScore, LATENESS_LIST_FILE, PlayoutSummary, SKIP_LIST_FILE,
    is_reportable_ratio, score_groups, score_groups_parallel, write_values,
};
pub use grouper::{FrameGroups, group_records};
pub use simulator::{FrameVerdict, GroupPlayout, capture_span_ms, simulate};
