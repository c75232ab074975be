use arbor_protocol::{to_subscript, ClumpId, IndexFormat, Indices, NULL_LABEL};
use serde::{Deserialize, Serialize};

use crate::components::{Head, TokenData, TokenKind, TokenRef};
use crate::sentence::Sentence;

/// Reading direction of the sentence. Only affects edge label glyphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionOptions {
    #[serde(default)]
    pub format: IndexFormat,
    #[serde(default)]
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Form,
    Pos,
    Multiword,
    Dependency,
}

/// One renderable node or edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub id: String,
    pub kind: ElementKind,
    pub label: String,
    /// Navigation number; set on forms and dependencies only.
    pub num: Option<u32>,
    pub clump: Option<ClumpId>,
    pub classes: Vec<String>,
    /// Absolute index of the owning token (the dependent, for edges).
    pub token: u32,
    /// Absolute index of the head, for edges.
    pub head: Option<u32>,
    pub parent: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    /// Which attribute an edit of this element writes to.
    pub attr: Option<&'static str>,
    pub enhanced: bool,
}

impl Element {
    fn new(id: String, kind: ElementKind, label: String, indices: &Indices) -> Self {
        Self {
            id,
            kind,
            label,
            num: None,
            clump: indices.clump,
            classes: Vec::new(),
            token: indices.absolute,
            head: None,
            parent: None,
            source: None,
            target: None,
            attr: None,
            enhanced: false,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: u32,
    pub total: u32,
}

impl Progress {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        f64::from(self.done) / f64::from(self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Flat view of a sentence, rebuilt from scratch after every edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub elements: Vec<Element>,
    pub progress: Progress,
    /// Number of lexical units (highest clump).
    pub clumps: u32,
    /// Number of numbered elements.
    pub length: u32,
}

impl Projection {
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn element_by_num(&self, num: u32) -> Option<&Element> {
        self.elements.iter().find(|e| e.num == Some(num))
    }

    /// Number after `num`, wrapping to the first element.
    pub fn next_num(&self, num: u32) -> Option<u32> {
        (self.length > 0).then(|| num % self.length + 1)
    }

    /// Number before `num`, wrapping to the last element.
    pub fn prev_num(&self, num: u32) -> Option<u32> {
        (self.length > 0).then(|| if num <= 1 || num > self.length { self.length } else { num - 1 })
    }

    /// First form drawn in `clump`.
    pub fn form_in_clump(&self, clump: ClumpId) -> Option<&Element> {
        self.elements
            .iter()
            .find(|e| e.kind == ElementKind::Form && e.clump == Some(clump))
    }

    /// Form of the neighbouring lexical unit, without wrapping.
    pub fn neighbor_form(&self, clump: ClumpId, side: Side) -> Option<&Element> {
        let next = match side {
            Side::Left => clump.0.checked_sub(1)?,
            Side::Right => clump.0 + 1,
        };
        self.form_in_clump(ClumpId::new(next))
    }
}

/// Extra style classes derived from annotation checks.
pub trait Classifier {
    fn pos_classes(&self, _pos: Option<&str>) -> Vec<String> {
        Vec::new()
    }

    fn edge_classes(&self, _dependent: TokenRef, _head: &Head) -> Vec<String> {
        Vec::new()
    }
}

/// Adds no classes.
pub struct Unvalidated;

impl Classifier for Unvalidated {}

fn filled(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v != "_")
}

/// Id used inside element ids. Tokens without a label in the scheme fall back to their absolute position.
fn element_key(indices: &Indices, format: IndexFormat) -> String {
    indices
        .label(format)
        .unwrap_or_else(|| format!("a{}", indices.absolute))
}

fn pos_for(data: &TokenData, format: IndexFormat) -> Option<&str> {
    let (first, second) = match format {
        IndexFormat::Cg3 => (&data.xpostag, &data.upostag),
        _ => (&data.upostag, &data.xpostag),
    };
    first.as_deref().or(second.as_deref())
}

fn edge_label(deprel: &str, dependent: u32, head: u32, direction: Direction) -> String {
    let points_right = match direction {
        Direction::Ltr => dependent > head,
        Direction::Rtl => dependent <= head,
    };
    if points_right {
        format!("{}⊳", deprel)
    } else {
        format!("⊲{}", deprel)
    }
}

/// Walk the sentence once and produce its renderable elements.
pub fn project(sentence: &Sentence, options: &ProjectionOptions, classifier: &dyn Classifier) -> Projection {
    let format = options.format;
    let enhanced = sentence.is_enhanced();
    let root = sentence.root();

    let mut projection = Projection::default();
    let mut num = 0;

    for token in sentence.tokens() {
        let (Some(kind), Some(indices)) = (sentence.kind(token), sentence.indices(token)) else {
            debug_assert!(false, "token {:?} lost its components", token);
            continue;
        };
        let is_super = matches!(kind, TokenKind::Super { .. });

        // Other analyses are not drawn
        if indices.clump.is_none() && !is_super {
            tracing::trace!(?token, "skipping token without clump");
            continue;
        }
        if let Some(clump) = indices.clump {
            projection.clumps = projection.clumps.max(clump.0);
        }

        let data = sentence.data(token).unwrap_or_default();
        let key = element_key(&indices, format);

        if is_super {
            let label = indices.label(format).unwrap_or_else(|| NULL_LABEL.to_string());
            let mut element = Element::new(
                format!("multiword-{}", key),
                ElementKind::Multiword,
                format!("{} {}", data.form, to_subscript(&label)),
                &indices,
            );
            element.add_class("multiword");
            element.attr = Some("form");
            projection.elements.push(element);
            continue;
        }

        let heads = sentence.heads(token);
        let pos = pos_for(&data, format);

        projection.progress.total += 2;
        if filled(pos) {
            projection.progress.done += 1;
        }
        if !heads.is_empty() {
            projection.progress.done += 1;
        }

        let parent = match kind {
            TokenKind::Sub { parent } => sentence
                .indices(parent)
                .map(|parent| format!("multiword-{}", element_key(&parent, format))),
            _ => None,
        };
        let shown: Vec<(usize, &Head)> = heads
            .iter()
            .enumerate()
            .filter(|(i, _)| enhanced || *i == 0)
            .collect();

        num += 1;
        let form_id = format!("form-{}", key);
        let label = if data.form.is_empty() { "_".to_string() } else { data.form.clone() };
        let mut form = Element::new(form_id.clone(), ElementKind::Form, label, &indices);
        form.num = Some(num);
        form.attr = Some("form");
        form.parent = parent;
        form.add_class("form");
        if shown.iter().any(|(_, head)| head.token == root) {
            form.add_class("root");
        }
        if data.is_empty {
            form.add_class("empty");
        }
        if matches!(kind, TokenKind::Sub { .. }) {
            form.add_class("sub-token");
        }
        projection.elements.push(form);

        let mut pos_element = Element::new(
            format!("pos-{}", key),
            ElementKind::Pos,
            pos.unwrap_or_default().to_string(),
            &indices,
        );
        pos_element.attr = Some(if format == IndexFormat::Cg3 { "xpostag" } else { "upostag" });
        pos_element.parent = Some(form_id.clone());
        pos_element.add_class("pos");
        for class in classifier.pos_classes(pos) {
            pos_element.add_class(&class);
        }
        projection.elements.push(pos_element);

        for (i, head) in shown {
            // Root attachments are drawn as a marker on the form
            if head.token == root {
                continue;
            }
            let Some(head_indices) = sentence.indices(head.token) else {
                debug_assert!(false, "head {:?} is not part of the sentence", head.token);
                continue;
            };

            projection.progress.total += 1;
            if filled(head.deprel.as_deref()) {
                projection.progress.done += 1;
            }

            num += 1;
            let head_key = element_key(&head_indices, format);
            let deprel = head.deprel.clone().unwrap_or_default();
            let mut edge = Element::new(
                format!("dep_{}_{}", key, head_key),
                ElementKind::Dependency,
                edge_label(&deprel, indices.absolute, head_indices.absolute, options.direction),
                &indices,
            );
            edge.num = Some(num);
            edge.head = Some(head_indices.absolute);
            edge.source = Some(match sentence.kind(head.token) {
                Some(TokenKind::Super { .. }) => format!("multiword-{}", head_key),
                _ => format!("form-{}", head_key),
            });
            edge.target = Some(form_id.clone());
            edge.attr = Some("deprel");
            edge.enhanced = i > 0;
            edge.add_class("dependency");
            if edge.enhanced {
                edge.add_class("enhanced");
            }
            for class in classifier.edge_classes(token, head) {
                edge.add_class(&class);
            }
            projection.elements.push(edge);
        }
    }

    projection.length = num;
    projection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::SentenceOptions;

    fn three_words() -> (Sentence, Vec<TokenRef>) {
        let mut sentence = Sentence::default();
        let tokens = ["dogs", "chase", "cats"]
            .into_iter()
            .map(|form| sentence.push(TokenData::word(form)))
            .collect();
        (sentence, tokens)
    }

    #[test]
    fn test_scenario_progress() {
        let (mut sentence, t) = three_words();
        sentence.add_head(t[0], t[1], Some("nsubj")).unwrap();
        sentence.add_head(t[2], t[1], Some("obj")).unwrap();
        sentence.set_root(t[1], None).unwrap();

        let projection = project(&sentence, &ProjectionOptions::default(), &Unvalidated);

        let roots: Vec<&Element> = projection.elements.iter().filter(|e| e.has_class("root")).collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, "form-2");

        let edges: Vec<&Element> = projection
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Dependency)
            .collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(projection.progress.total, 3 * 2 + 2);
        // three attached tokens, two labelled edges, no tags
        assert_eq!(projection.progress.done, 5);
        assert_eq!(projection.progress.ratio(), 5.0 / 8.0);
        assert_eq!(Progress::default().ratio(), 1.0);
        assert_eq!(projection.clumps, 3);
        assert_eq!(projection.length, 5);
    }

    #[test]
    fn test_edge_labels_follow_direction() {
        let (mut sentence, t) = three_words();
        sentence.add_head(t[0], t[1], Some("nsubj")).unwrap();
        sentence.add_head(t[2], t[1], Some("obj")).unwrap();

        let ltr = project(&sentence, &ProjectionOptions::default(), &Unvalidated);
        assert_eq!(ltr.element_by_id("dep_1_2").unwrap().label, "⊲nsubj");
        assert_eq!(ltr.element_by_id("dep_3_2").unwrap().label, "obj⊳");

        let options = ProjectionOptions { direction: Direction::Rtl, ..Default::default() };
        let rtl = project(&sentence, &options, &Unvalidated);
        assert_eq!(rtl.element_by_id("dep_1_2").unwrap().label, "nsubj⊳");
        assert_eq!(rtl.element_by_id("dep_3_2").unwrap().label, "⊲obj");

        let edge = ltr.element_by_id("dep_3_2").unwrap();
        assert_eq!(edge.source.as_deref(), Some("form-2"));
        assert_eq!(edge.target.as_deref(), Some("form-3"));
    }

    #[test]
    fn test_multiword_elements() {
        let mut sentence = Sentence::default();
        let verb = sentence.push(TokenData::word("mange").with_upos("VERB"));
        let (du, members) = sentence
            .push_multiword("du", vec![TokenData::word("de").with_upos("ADP"), TokenData::word("le")])
            .unwrap();
        sentence.add_head(members[0], verb, Some("case")).unwrap();

        let projection = project(&sentence, &ProjectionOptions::default(), &Unvalidated);
        let multiword = projection.element_by_id("multiword-2-3").unwrap();
        assert_eq!(multiword.label, "du ₂₋₃");
        assert_eq!(multiword.clump, Some(ClumpId(2)));

        let de = projection.element_by_id("form-2").unwrap();
        assert_eq!(de.parent.as_deref(), Some("multiword-2-3"));
        assert!(de.has_class("sub-token"));
        assert_eq!(de.clump, multiword.clump);
        assert_eq!(projection.element_by_id("pos-2").unwrap().label, "ADP");

        // CG3 has no id for the multiword token
        let options = ProjectionOptions { format: IndexFormat::Cg3, ..Default::default() };
        let cg3 = project(&sentence, &options, &Unvalidated);
        let abs = sentence.indices(du).unwrap().absolute;
        let multiword = cg3.element_by_id(&format!("multiword-a{}", abs)).unwrap();
        assert_eq!(multiword.label, "du ");
    }

    #[test]
    fn test_enhanced_edges_only_in_enhanced_mode() {
        let mut sentence = Sentence::new(SentenceOptions { enhanced: true });
        let a = sentence.push(TokenData::word("a"));
        let b = sentence.push(TokenData::word("b"));
        let c = sentence.push(TokenData::word("c"));
        sentence.add_head(c, a, Some("conj")).unwrap();
        sentence.add_head(c, b, Some("nsubj")).unwrap();

        let full = project(&sentence, &ProjectionOptions::default(), &Unvalidated);
        let secondary = full.element_by_id("dep_3_2").unwrap();
        assert!(secondary.enhanced);
        assert!(secondary.has_class("enhanced"));

        sentence.set_enhanced(false);
        let basic = project(&sentence, &ProjectionOptions::default(), &Unvalidated);
        assert!(basic.element_by_id("dep_3_1").is_some());
        assert!(basic.element_by_id("dep_3_2").is_none());
        assert_eq!(full.progress.total, basic.progress.total + 1);
    }

    #[test]
    fn test_navigation_wraps() {
        let (mut sentence, t) = three_words();
        sentence.add_head(t[0], t[1], Some("nsubj")).unwrap();
        let projection = project(&sentence, &ProjectionOptions::default(), &Unvalidated);

        assert_eq!(projection.length, 4);
        assert_eq!(projection.next_num(4), Some(1));
        assert_eq!(projection.next_num(2), Some(3));
        assert_eq!(projection.prev_num(1), Some(4));
        assert_eq!(projection.element_by_num(2).unwrap().kind, ElementKind::Dependency);

        let middle = projection.form_in_clump(ClumpId(2)).unwrap();
        assert_eq!(middle.label, "chase");
        assert_eq!(projection.neighbor_form(ClumpId(2), Side::Left).unwrap().label, "dogs");
        assert_eq!(projection.neighbor_form(ClumpId(3), Side::Right), None);
        assert_eq!(projection.neighbor_form(ClumpId(1), Side::Left), None);

        assert_eq!(Projection::default().next_num(1), None);
    }

    #[test]
    fn test_edge_endpoints_resolve() {
        let (mut sentence, t) = three_words();
        sentence.add_head(t[0], t[1], Some("nsubj")).unwrap();
        let sup = sentence.combine(t[1], t[2]).unwrap();
        sentence.add_head(t[2], t[0], Some("dep")).unwrap();

        for format in [IndexFormat::Conllu, IndexFormat::Cg3, IndexFormat::Internal] {
            let options = ProjectionOptions { format, ..Default::default() };
            let projection = project(&sentence, &options, &Unvalidated);
            let edges: Vec<&Element> = projection
                .elements
                .iter()
                .filter(|e| e.kind == ElementKind::Dependency)
                .collect();
            assert_eq!(edges.len(), 2);
            for edge in edges {
                for end in [&edge.source, &edge.target] {
                    let id = end.as_deref().unwrap();
                    assert!(projection.element_by_id(id).is_some(), "{} does not resolve", id);
                }
            }
        }

        let projection = project(&sentence, &ProjectionOptions::default(), &Unvalidated);
        let edge = projection.element_by_id("dep_1_2-3").unwrap();
        assert_eq!(edge.source.as_deref(), Some("multiword-2-3"));
        assert_eq!(edge.head, sentence.indices(sup).map(|i| i.absolute));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let (mut sentence, t) = three_words();
        sentence.add_head(t[2], t[1], Some("obj")).unwrap();
        let first = project(&sentence, &ProjectionOptions::default(), &Unvalidated);
        let second = project(&sentence, &ProjectionOptions::default(), &Unvalidated);
        assert_eq!(first, second);
    }
}
