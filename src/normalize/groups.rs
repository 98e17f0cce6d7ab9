//! Sequential group id assignment

use std::collections::HashMap;

use tracing::debug;

use crate::types::{GroupId, GroupKey};

/// Injective, first-sight `GroupKey -> GroupId` assignment.
///
/// Ids start at 0 and grow by one for every new key. An id, once handed
/// out, is returned for that key for the rest of the run.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    ids: HashMap<GroupKey, GroupId>,
    next: u32,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `key`, allocating the next one on first sight.
    pub fn resolve(&mut self, key: GroupKey) -> GroupId {
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = GroupId(self.next);
        self.next += 1;
        self.ids.insert(key, id);
        debug!(group = %id, ssrc = key.ssrc, flow = %key.five_tuple, "New group");
        id
    }

    pub fn get(&self, key: &GroupKey) -> Option<GroupId> {
        self.ids.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FiveTuple;
    use std::net::Ipv4Addr;

    fn key(ssrc: u32) -> GroupKey {
        GroupKey {
            five_tuple: FiveTuple::udp(Ipv4Addr::LOCALHOST, 1000, Ipv4Addr::LOCALHOST, 2000),
            ssrc,
        }
    }

    #[test]
    fn ids_are_sequential_and_stable() {
        let mut groups = GroupRegistry::new();
        assert_eq!(groups.resolve(key(50)), GroupId(0));
        assert_eq!(groups.resolve(key(7)), GroupId(1));
        assert_eq!(groups.resolve(key(50)), GroupId(0));
        assert_eq!(groups.resolve(key(9)), GroupId(2));
        assert_eq!(groups.get(&key(7)), Some(GroupId(1)));
        assert_eq!(groups.get(&key(8)), None);
        assert_eq!(groups.len(), 3);
    }
}
