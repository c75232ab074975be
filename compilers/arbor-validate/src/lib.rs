pub mod graph;
pub mod labels;
pub mod validator;

pub use graph::DependencyGraph;
pub use labels::{U_DEPRELS, U_POS};
pub use validator::{Diagnostic, DiagnosticKind, UdValidator, CYCLE_CLASS, ERROR_CLASS, INCOMPLETE_CLASS};

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_graph::{project, ProjectionOptions, Sentence, TokenData, TokenRef};
    use arbor_protocol::IndexFormat;

    fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
        diagnostics.iter().map(|d| d.kind).collect()
    }

    fn tagged(forms: &[(&str, &str)]) -> (Sentence, Vec<TokenRef>) {
        let mut sentence = Sentence::default();
        let tokens = forms
            .iter()
            .map(|(form, pos)| sentence.push(TokenData::word(*form).with_upos(*pos)))
            .collect();
        (sentence, tokens)
    }

    #[test]
    fn test_clean_tree() {
        let (mut s, t) = tagged(&[("dogs", "NOUN"), ("bark", "VERB")]);
        s.set_root(t[1], None).unwrap();
        s.add_head(t[0], t[1], Some("nsubj:pass")).unwrap();

        let validator = UdValidator::new(&s, IndexFormat::Conllu);
        assert!(validator.diagnose(&s).is_empty());
    }

    #[test]
    fn test_cycle_is_reported() {
        let (mut s, t) = tagged(&[("a", "X"), ("b", "X"), ("c", "X")]);
        s.set_root(t[2], None).unwrap();
        s.add_head(t[0], t[1], Some("dep")).unwrap();
        s.add_head(t[1], t[0], Some("dep")).unwrap();

        let graph = DependencyGraph::from_sentence(&s);
        assert_eq!(graph.node_count(), 4);
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 2);
        assert!(graph.reaches_root(t[2]));
        assert!(!graph.reaches_root(t[0]));

        let validator = UdValidator::new(&s, IndexFormat::Conllu);
        assert_eq!(kinds(&validator.diagnose(&s)), vec![DiagnosticKind::Cycle, DiagnosticKind::Cycle]);

        let projection = project(&s, &ProjectionOptions::default(), &validator);
        let edge = projection.element_by_id("dep_1_2").unwrap();
        assert!(edge.has_class(CYCLE_CLASS));
    }

    #[test]
    fn test_labels_and_attachment() {
        let (mut s, t) = tagged(&[("a", "NOUNISH"), ("b", "VERB"), ("c", "ADV")]);
        s.set_enhanced(true);
        s.set_root(t[1], None).unwrap();
        s.set_root(t[2], None).unwrap();
        s.add_head(t[0], t[1], Some("subject")).unwrap();
        s.add_head(t[2], t[1], None).unwrap();

        let validator = UdValidator::new(&s, IndexFormat::Conllu);
        let diagnostics = validator.diagnose(&s);
        assert_eq!(
            kinds(&diagnostics),
            vec![
                DiagnosticKind::UnknownPos,
                DiagnosticKind::UnknownDeprel,
                DiagnosticKind::MultipleRoots,
                DiagnosticKind::MissingDeprel,
            ]
        );
        assert_eq!(diagnostics[0].absolute, 1);

        let projection = project(&s, &ProjectionOptions::default(), &validator);
        assert!(projection.element_by_id("pos-1").unwrap().has_class(ERROR_CLASS));
        assert!(projection.element_by_id("dep_1_2").unwrap().has_class(ERROR_CLASS));
        assert!(projection.element_by_id("dep_3_2").unwrap().has_class(INCOMPLETE_CLASS));
    }

    #[test]
    fn test_unattached_word() {
        let mut s = Sentence::default();
        let a = s.push(TokenData::word("a"));
        s.push(TokenData::word("b"));
        s.set_root(a, None).unwrap();

        let diagnostics = UdValidator::new(&s, IndexFormat::Conllu).diagnose(&s);
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::Unattached]);
        assert_eq!(diagnostics[0].absolute, 2);
    }

    #[test]
    fn test_cg3_skips_universal_tags() {
        let (s, _) = tagged(&[("a", "n")]);
        let validator = UdValidator::new(&s, IndexFormat::Cg3);
        assert!(!kinds(&validator.diagnose(&s)).contains(&DiagnosticKind::UnknownPos));
        assert!(labels::is_deprel("obl:tmod"));
        assert!(labels::is_blank(Some("_")));
    }
}
