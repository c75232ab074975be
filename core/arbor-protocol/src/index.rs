use rkyv::{Archive, Deserialize, Serialize};
use crate::ids::ClumpId;
use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Literal some callers pass across the renderer boundary instead of a typed absence.
pub const NULL_LABEL: &str = "null";

/// Which numbering scheme a label is requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub enum IndexFormat {
    #[cfg_attr(feature = "serde", serde(rename = "CoNLL-U"))]
    #[default]
    Conllu,
    #[cfg_attr(feature = "serde", serde(rename = "CG3"))]
    Cg3,
    /// Plain absolute order.
    #[cfg_attr(feature = "serde", serde(rename = "internal"))]
    Internal,
}

/// A CoNLL-U style token id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub enum ConlluId {
    /// The synthetic root, always `0`.
    Root,
    /// A syntactic word, e.g. `3`.
    Word(u32),
    /// An empty node hanging after word `n`, e.g. `8.1`.
    Empty(u32, u32),
    /// A multiword span over words `a..=b`, e.g. `3-4`.
    Range(u32, u32),
}

impl ConlluId {
    /// Integral word number, if this id names a single regular word.
    pub fn word(&self) -> Option<u32> {
        match self {
            ConlluId::Word(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ConlluId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConlluId::Root => write!(f, "0"),
            ConlluId::Word(n) => write!(f, "{}", n),
            ConlluId::Empty(n, m) => write!(f, "{}.{}", n, m),
            ConlluId::Range(a, b) => write!(f, "{}-{}", a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelParseError {
    pub label: String,
}

impl fmt::Display for LabelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a CoNLL-U token id: {:?}", self.label)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LabelParseError {}

impl FromStr for ConlluId {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || LabelParseError { label: s.to_string() };
        let num = |part: &str| part.parse::<u32>().map_err(|_| err());

        if let Some((a, b)) = s.split_once('-') {
            return Ok(ConlluId::Range(num(a)?, num(b)?));
        }
        if let Some((n, m)) = s.split_once('.') {
            return Ok(ConlluId::Empty(num(n)?, num(m)?));
        }
        match num(s)? {
            0 => Ok(ConlluId::Root),
            n => Ok(ConlluId::Word(n)),
        }
    }
}

/// Every numbering a token participates in. Recomputed as a whole by the
/// re-index pass; never patched field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct Indices {
    /// Flattened input order. Root is 0, a multiword token precedes its members.
    pub absolute: u32,
    pub conllu: Option<ConlluId>,
    /// CG3 has no decimal or range ids; multiword tokens get none.
    pub cg3: Option<u32>,
    pub clump: Option<ClumpId>,
}

impl Indices {
    pub fn root() -> Self {
        Self {
            absolute: 0,
            conllu: Some(ConlluId::Root),
            cg3: Some(0),
            clump: None,
        }
    }

    /// Label of this token in the requested scheme, `None` if the scheme has no id for it.
    pub fn label(&self, format: IndexFormat) -> Option<String> {
        match format {
            IndexFormat::Conllu => self.conllu.map(|id| id.to_string()),
            IndexFormat::Cg3 => self.cg3.map(|n| n.to_string()),
            IndexFormat::Internal => Some(self.absolute.to_string()),
        }
    }

    pub fn matches(&self, label: &str, format: IndexFormat) -> bool {
        match format {
            IndexFormat::Conllu => match (self.conllu, label.parse::<ConlluId>()) {
                (Some(own), Ok(other)) => own == other,
                _ => false,
            },
            IndexFormat::Cg3 => self.cg3.is_some_and(|n| label.parse::<u32>() == Ok(n)),
            IndexFormat::Internal => label.parse::<u32>() == Ok(self.absolute),
        }
    }
}

fn subscript_char(c: char) -> char {
    match c {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '-' => '₋',
        '(' => '₍',
        ')' => '₎',
        other => other,
    }
}

/// Compact display form of an index label. The `"null"` literal renders as nothing.
pub fn to_subscript(label: &str) -> String {
    if label == NULL_LABEL {
        return String::new();
    }
    label.chars().map(subscript_char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conllu_labels() {
        for raw in ["0", "3", "8.1", "3-4"] {
            let id: ConlluId = raw.parse().expect("valid id");
            assert_eq!(id.to_string(), raw);
        }
        assert_eq!("0".parse::<ConlluId>(), Ok(ConlluId::Root));
        assert!("x".parse::<ConlluId>().is_err());
        assert!("3-".parse::<ConlluId>().is_err());

        assert_eq!(ConlluId::Word(3).word(), Some(3));
        assert_eq!(ConlluId::Empty(3, 1).word(), None);
        assert_eq!(ConlluId::Range(3, 4).word(), None);
    }

    #[test]
    fn test_subscript() {
        assert_eq!(to_subscript("3-4"), "₃₋₄");
        assert_eq!(to_subscript("(12)"), "₍₁₂₎");
        assert_eq!(to_subscript("8.1"), "₈.₁");
        assert_eq!(to_subscript("null"), "");
        assert_eq!(to_subscript(""), "");
    }

    #[test]
    fn test_label_per_format() {
        let idx = Indices {
            absolute: 5,
            conllu: Some(ConlluId::Empty(3, 1)),
            cg3: Some(4),
            clump: Some(ClumpId(4)),
        };
        assert_eq!(idx.label(IndexFormat::Conllu).as_deref(), Some("3.1"));
        assert_eq!(idx.label(IndexFormat::Cg3).as_deref(), Some("4"));
        assert_eq!(idx.label(IndexFormat::Internal).as_deref(), Some("5"));
        assert!(idx.matches("3.1", IndexFormat::Conllu));
        assert!(!idx.matches("3", IndexFormat::Conllu));
        assert!(idx.matches("4", IndexFormat::Cg3));

        let multiword = Indices { cg3: None, ..idx };
        assert_eq!(multiword.label(IndexFormat::Cg3), None);
    }
}
