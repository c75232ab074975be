use hecs::Entity;

/// Identity-stable handle to a token. Survives re-indexing and every edit
/// that keeps the token alive.
pub type TokenRef = Entity;

/// Surface data of a word (Source of Truth for the format layer)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenData {
    pub form: String,
    pub upostag: Option<String>,
    pub xpostag: Option<String>,
    pub is_empty: bool,
}

impl TokenData {
    pub fn word(form: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            ..Self::default()
        }
    }

    /// An elided node for the enhanced graph.
    pub fn empty() -> Self {
        Self {
            form: "_".to_string(),
            is_empty: true,
            ..Self::default()
        }
    }

    pub fn with_upos(mut self, tag: impl Into<String>) -> Self {
        self.upostag = Some(tag.into());
        self
    }

    pub fn with_xpos(mut self, tag: impl Into<String>) -> Self {
        self.xpostag = Some(tag.into());
        self
    }
}

/// Structural role of a token inside the sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// The synthetic attachment target. Exactly one per sentence.
    Root,
    /// A word standing on its own.
    Plain,
    /// A multiword span. Members are contiguous and in sentence order.
    Super { members: Vec<Entity> },
    /// A word owned by exactly one multiword span.
    Sub { parent: Entity },
}

impl TokenKind {
    /// Whether the token carries its own heads.
    pub fn is_word(&self) -> bool {
        matches!(self, TokenKind::Plain | TokenKind::Sub { .. })
    }
}

/// One dependency edge, stored on the dependent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub token: Entity,
    pub deprel: Option<String>,
    /// Set on every edge after the first one.
    pub enhanced: bool,
}

/// Dependency edges of a word. The first entry is the basic (primary) head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heads(pub Vec<Head>);

impl Heads {
    pub fn position(&self, head: Entity) -> Option<usize> {
        self.0.iter().position(|h| h.token == head)
    }

    pub fn contains(&self, head: Entity) -> bool {
        self.position(head).is_some()
    }

    pub fn primary(&self) -> Option<&Head> {
        self.0.first()
    }

    /// Removes the edge at `i`, promoting the next edge to primary if needed.
    pub fn remove_at(&mut self, i: usize) -> Head {
        let removed = self.0.remove(i);
        self.normalize();
        removed
    }

    pub(crate) fn normalize(&mut self) {
        for (i, head) in self.0.iter_mut().enumerate() {
            head.enhanced = i > 0;
        }
    }
}
