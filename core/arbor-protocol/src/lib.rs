#![no_std] // Keeps the records usable from WASM front ends

extern crate alloc;

// Enable std if the feature is active (for tests/tools)
#[cfg(feature = "std")]
extern crate std;

pub mod ids;
pub mod index;
pub mod snapshot;
pub mod style;

// Re-export core types for convenience
pub use ids::{ClumpId, SentenceId};
pub use index::{to_subscript, ConlluId, IndexFormat, Indices, LabelParseError, NULL_LABEL};
pub use snapshot::{HeadRecord, RecordKind, SentenceSnapshot, TokenRecord};
pub use style::LockStyle;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rkyv::{to_bytes, from_bytes};

    #[test]
    fn test_indices_serialization() {
        let original = Indices {
            absolute: 7,
            conllu: Some(ConlluId::Range(4, 5)),
            cg3: None,
            clump: Some(ClumpId::new(4)),
        };

        let bytes = to_bytes::<_, 256>(&original).expect("Failed to serialize Indices");
        let deserialized: Indices = from_bytes(&bytes).expect("Failed to deserialize Indices");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_snapshot_serialization() {
        // "du" = "de" + "le", attached to the verb
        let original = SentenceSnapshot {
            enhanced: false,
            tokens: vec![
                TokenRecord::word("mange").with_head(0, Some("root")),
                TokenRecord {
                    kind: RecordKind::MultiWord { span: 2 },
                    ..TokenRecord::word("du")
                },
                TokenRecord::word("de").with_head(5, Some("case")),
                TokenRecord::word("le").with_head(5, Some("det")),
                TokenRecord::word("pain").with_head(1, Some("obj")),
            ],
        };

        let bytes = to_bytes::<_, 1024>(&original).expect("Failed to serialize snapshot");
        let deserialized: SentenceSnapshot = from_bytes(&bytes).expect("Failed to deserialize snapshot");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_id_layout() {
        assert_eq!(core::mem::size_of::<ClumpId>(), 4);
        assert_eq!(core::mem::size_of::<SentenceId>(), 4);
    }

    #[test]
    fn test_lock_style_classes() {
        let style = LockStyle::from_classes("form selected locked merge-source".split(' '));
        assert_eq!(style, LockStyle::SELECTED | LockStyle::MERGE_SOURCE);
        assert_eq!(style.class_names(), vec!["selected", "merge-source"]);
        assert!(LockStyle::from_classes(["form", "root"]).is_empty());
    }
}
