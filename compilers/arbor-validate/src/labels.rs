/// Universal part-of-speech tags.
pub const U_POS: [&str; 17] = [
    "ADJ", "ADP", "ADV", "AUX", "CCONJ", "DET", "INTJ", "NOUN", "NUM", "PART", "PRON", "PROPN",
    "PUNCT", "SCONJ", "SYM", "VERB", "X",
];

/// Universal dependency relations, without language-specific subtypes.
pub const U_DEPRELS: [&str; 37] = [
    "acl", "advcl", "advmod", "amod", "appos", "aux", "case", "cc", "ccomp", "clf", "compound",
    "conj", "cop", "csubj", "dep", "det", "discourse", "dislocated", "expl", "fixed", "flat",
    "goeswith", "iobj", "list", "mark", "nmod", "nsubj", "nummod", "obj", "obl", "orphan",
    "parataxis", "punct", "reparandum", "root", "vocative", "xcomp",
];

pub fn is_upos(tag: &str) -> bool {
    U_POS.contains(&tag)
}

/// `nsubj:pass` is checked by its base relation `nsubj`.
pub fn is_deprel(deprel: &str) -> bool {
    let base = deprel.split(':').next().unwrap_or(deprel);
    U_DEPRELS.contains(&base)
}

/// Empty and `_` count as not annotated yet.
pub fn is_blank(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(value) => value.trim().is_empty() || value == "_",
    }
}
