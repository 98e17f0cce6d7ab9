//! Partition frame rows by group

use std::collections::BTreeMap;

use crate::types::{FrameRecord, GroupId};

/// Frame rows per group, in ascending group id order.
pub type FrameGroups = BTreeMap<GroupId, Vec<FrameRecord>>;

/// Split rows by `group_id`, keeping input order inside each group.
pub fn group_records(records: impl IntoIterator<Item = FrameRecord>) -> FrameGroups {
    let mut groups = FrameGroups::new();
    for record in records {
        groups.entry(record.group_id).or_default().push(record);
    }
    groups
}
