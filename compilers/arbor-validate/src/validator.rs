use std::collections::HashSet;

use arbor_graph::{Classifier, Head, Sentence, TokenRef};
use arbor_protocol::IndexFormat;
use serde::Serialize;

use crate::graph::DependencyGraph;
use crate::labels::{is_blank, is_deprel, is_upos};

pub const ERROR_CLASS: &str = "error";
pub const INCOMPLETE_CLASS: &str = "incomplete";
pub const CYCLE_CLASS: &str = "cycle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    Cycle,
    Unattached,
    MultipleRoots,
    UnknownPos,
    UnknownDeprel,
    MissingDeprel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip)]
    pub token: TokenRef,
    /// Absolute index of the token the diagnostic is about.
    pub absolute: u32,
    pub message: String,
}

/// Checks a sentence against the universal tag sets and the tree shape.
pub struct UdValidator {
    format: IndexFormat,
    cycle_edges: HashSet<(TokenRef, TokenRef)>,
}

impl UdValidator {
    pub fn new(sentence: &Sentence, format: IndexFormat) -> Self {
        Self {
            format,
            cycle_edges: DependencyGraph::from_sentence(sentence).cycle_edges(),
        }
    }

    /// Every problem found, in sentence order.
    pub fn diagnose(&self, sentence: &Sentence) -> Vec<Diagnostic> {
        let graph = DependencyGraph::from_sentence(sentence);
        let mut diagnostics = Vec::new();
        let mut roots = 0;

        for token in sentence.tokens() {
            let Some(view) = sentence.token(token) else {
                continue;
            };
            if !view.kind.is_word() {
                continue;
            }
            let absolute = view.indices.absolute;
            let mut report = |kind, message: String| {
                diagnostics.push(Diagnostic { kind, token, absolute, message });
            };

            if self.format != IndexFormat::Cg3 {
                if let Some(tag) = view.data.upostag.as_deref().filter(|tag| !is_blank(Some(tag))) {
                    if !is_upos(tag) {
                        report(DiagnosticKind::UnknownPos, format!("'{}' is not a universal POS tag", tag));
                    }
                }
            }

            let Some(primary) = view.heads.first() else {
                report(DiagnosticKind::Unattached, format!("'{}' has no head", view.data.form));
                continue;
            };
            if primary.token == sentence.root() {
                roots += 1;
                if roots > 1 {
                    report(DiagnosticKind::MultipleRoots, format!("'{}' is a second root", view.data.form));
                }
            }

            for head in &view.heads {
                match head.deprel.as_deref() {
                    deprel if is_blank(deprel) => report(
                        DiagnosticKind::MissingDeprel,
                        format!("edge of '{}' has no relation", view.data.form),
                    ),
                    Some(deprel) if !is_deprel(deprel) => report(
                        DiagnosticKind::UnknownDeprel,
                        format!("'{}' is not a universal relation", deprel),
                    ),
                    _ => {}
                }
            }

            if self.cycle_edges.contains(&(token, primary.token)) {
                report(DiagnosticKind::Cycle, format!("'{}' is part of a cycle", view.data.form));
            } else if !graph.reaches_root(token) {
                report(DiagnosticKind::Unattached, format!("'{}' does not reach the root", view.data.form));
            }
        }

        tracing::debug!(problems = diagnostics.len(), "validated sentence");
        diagnostics
    }
}

impl Classifier for UdValidator {
    fn pos_classes(&self, pos: Option<&str>) -> Vec<String> {
        match pos {
            pos if is_blank(pos) => vec![INCOMPLETE_CLASS.to_string()],
            Some(tag) if self.format != IndexFormat::Cg3 && !is_upos(tag) => vec![ERROR_CLASS.to_string()],
            _ => Vec::new(),
        }
    }

    fn edge_classes(&self, dependent: TokenRef, head: &Head) -> Vec<String> {
        let mut classes = Vec::new();
        match head.deprel.as_deref() {
            deprel if is_blank(deprel) => classes.push(INCOMPLETE_CLASS.to_string()),
            Some(deprel) if !is_deprel(deprel) => classes.push(ERROR_CLASS.to_string()),
            _ => {}
        }
        if self.cycle_edges.contains(&(dependent, head.token)) {
            classes.push(CYCLE_CLASS.to_string());
        }
        classes
    }
}
