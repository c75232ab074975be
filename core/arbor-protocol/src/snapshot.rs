use rkyv::{Archive, Deserialize, Serialize};
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Flat record of one sentence, exchanged with the format layer.
///
/// Records appear in flattened sentence order. A multiword record is followed
/// by its `span` member records. Head references use absolute indices, where
/// `0` is the synthetic root and `1` is the first record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct SentenceSnapshot {
    #[cfg_attr(feature = "serde", serde(default))]
    pub enhanced: bool,
    pub tokens: Vec<TokenRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[archive(check_bytes)]
pub struct TokenRecord {
    pub form: String,
    pub upostag: Option<String>,
    pub xpostag: Option<String>,
    pub is_empty: bool,
    pub kind: RecordKind,
    pub heads: Vec<HeadRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[archive(check_bytes)]
pub enum RecordKind {
    #[default]
    Word,
    MultiWord { span: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct HeadRecord {
    pub head: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub deprel: Option<String>,
}

impl TokenRecord {
    pub fn word(form: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            ..Self::default()
        }
    }

    pub fn with_head(mut self, head: u32, deprel: Option<&str>) -> Self {
        self.heads.push(HeadRecord {
            head,
            deprel: deprel.map(String::from),
        });
        self
    }
}
