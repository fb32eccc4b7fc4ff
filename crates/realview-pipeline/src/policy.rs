use std::collections::BTreeSet;

use realview_core::RoomType;

/// Room types eligible for feature detection and consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList(BTreeSet<RoomType>);

impl AllowList {
    pub fn new(rooms: impl IntoIterator<Item = RoomType>) -> Self {
        Self(rooms.into_iter().collect())
    }

    pub fn contains(&self, room_type: RoomType) -> bool {
        self.0.contains(&room_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = RoomType> + '_ {
        self.0.iter().copied()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new([RoomType::Kitchen, RoomType::Bathroom])
    }
}

impl FromIterator<RoomType> for AllowList {
    fn from_iter<I: IntoIterator<Item = RoomType>>(iter: I) -> Self {
        Self::new(iter)
    }
}
