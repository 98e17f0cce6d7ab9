//! Result aggregation across groups
//!
//! Groups are scored in ascending id order. Lateness ratios are filtered to
//! the reportable domain; every verdict contributes its skip and freeze to
//! the pooled lists, zeros included.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use futures::future::join_all;
use tracing::{debug, info};

use super::grouper::FrameGroups;
use super::simulator::{GroupPlayout, simulate};
use crate::types::GroupId;
use crate::{AnalysisError, Result};

pub const LATENESS_LIST_FILE: &str = "special_percent_list.csv";
pub const SKIP_LIST_FILE: &str = "skip_list.csv";
pub const FREEZE_LIST_FILE: &str = "freeze_list.csv";

/// A ratio is kept only when finite and in `[0, 1)`.
pub fn is_reportable_ratio(ratio: f64) -> bool {
    ratio.is_finite() && (0.0..1.0).contains(&ratio)
}

/// Per-group result kept alongside the pooled lists.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupScore {
    pub group_id: GroupId,
    pub frames: usize,
    pub playout: GroupPlayout,
}

/// Pooled stage (b) results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayoutSummary {
    pub lateness_ratios: Vec<f64>,
    pub skips: Vec<i64>,
    pub freezes: Vec<i64>,
    pub groups: Vec<GroupScore>,
}

impl PlayoutSummary {
    fn push(&mut self, score: GroupScore) {
        let ratio = score.playout.lateness_ratio;
        if is_reportable_ratio(ratio) {
            self.lateness_ratios.push(ratio);
        } else {
            debug!(group = %score.group_id, ratio, "Dropping out-of-range lateness ratio");
        }
        for verdict in &score.playout.verdicts {
            self.skips.push(verdict.skip);
            self.freezes.push(verdict.freeze);
        }
        self.groups.push(score);
    }

    /// Write the three result lists into `dir`, creating it if needed.
    pub fn write_lists(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .map_err(|e| AnalysisError::output(format!("directory {}", dir.display()), e))?;

        write_list_file(&dir.join(LATENESS_LIST_FILE), &self.lateness_ratios)?;
        write_list_file(&dir.join(SKIP_LIST_FILE), &self.skips)?;
        write_list_file(&dir.join(FREEZE_LIST_FILE), &self.freezes)?;

        info!(
            ratios = self.lateness_ratios.len(),
            verdicts = self.skips.len(),
            "Wrote playout lists to {}",
            dir.display()
        );
        Ok(())
    }
}

/// One value per line.
pub fn write_values<W: Write, T: std::fmt::Display>(writer: W, values: &[T]) -> io::Result<()> {
    let mut out = BufWriter::new(writer);
    for value in values {
        writeln!(out, "{}", value)?;
    }
    out.flush()
}

fn write_list_file<T: std::fmt::Display>(path: &Path, values: &[T]) -> Result<()> {
    let context = || path.display().to_string();
    let file = File::create(path).map_err(|e| AnalysisError::output(context(), e))?;
    write_values(file, values).map_err(|e| AnalysisError::output(context(), e))
}

/// Score every group sequentially.
pub fn score_groups(groups: &FrameGroups) -> PlayoutSummary {
    let mut summary = PlayoutSummary::default();
    for (&group_id, frames) in groups {
        summary.push(GroupScore { group_id, frames: frames.len(), playout: simulate(frames) });
    }
    info!(groups = summary.groups.len(), "Scored frame groups");
    summary
}

/// Score groups on the blocking pool; results are pooled in group order,
/// so the summary equals [`score_groups`] on the same input.
pub async fn score_groups_parallel(groups: FrameGroups) -> Result<PlayoutSummary> {
    let tasks = groups.into_iter().map(|(group_id, frames)| {
        tokio::task::spawn_blocking(move || GroupScore {
            group_id,
            frames: frames.len(),
            playout: simulate(&frames),
        })
    });

    let mut summary = PlayoutSummary::default();
    for joined in join_all(tasks).await {
        let score = joined.map_err(|e| AnalysisError::worker(e.to_string()))?;
        summary.push(score);
    }
    info!(groups = summary.groups.len(), "Scored frame groups in parallel");
    Ok(summary)
}
