use bitflags::bitflags;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

bitflags! {
    /// Style tags that describe what a locked element is being used for.
    /// Anything outside this set is transient and not restored after a redraw.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
    pub struct LockStyle: u8 {
        const SELECTED = 1;
        const ACTIVATED = 2;
        const MULTIWORD_ACTIVE = 4;
        const MERGE_SOURCE = 8;
        const COMBINE_SOURCE = 16;
    }
}

const CLASS_NAMES: [(LockStyle, &str); 5] = [
    (LockStyle::SELECTED, "selected"),
    (LockStyle::ACTIVATED, "activated"),
    (LockStyle::MULTIWORD_ACTIVE, "multiword-active"),
    (LockStyle::MERGE_SOURCE, "merge-source"),
    (LockStyle::COMBINE_SOURCE, "combine-source"),
];

impl LockStyle {
    pub fn from_class(class: &str) -> Option<Self> {
        CLASS_NAMES
            .iter()
            .find(|(_, name)| *name == class)
            .map(|(flag, _)| *flag)
    }

    /// Keeps only the lockable classes of `classes`, in any order.
    pub fn from_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> Self {
        classes
            .into_iter()
            .filter_map(Self::from_class)
            .fold(Self::empty(), |acc, flag| acc | flag)
    }

    pub fn class_names(&self) -> Vec<&'static str> {
        CLASS_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}
