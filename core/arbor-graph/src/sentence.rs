use arbor_protocol::{HeadRecord, IndexFormat, Indices, RecordKind, SentenceSnapshot, TokenRecord};
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::components::{Head, Heads, TokenData, TokenKind, TokenRef};
use crate::error::GraphError;
use crate::systems::reindex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceOptions {
    /// Secondary heads are only drawn and accepted in enhanced mode.
    #[serde(default)]
    pub enhanced: bool,
}

/// Read-only copy of everything known about one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenView {
    pub kind: TokenKind,
    pub data: TokenData,
    pub indices: Indices,
    pub heads: Vec<Head>,
}

/// One sentence: the synthetic root plus its tokens, stored as ECS entities.
///
/// `order` holds the top-level lexical units. A multiword token lists its own
/// members, so flattened sentence order is each unit followed by its members.
pub struct Sentence {
    pub(crate) world: World,
    pub(crate) root: Entity,
    pub(crate) order: Vec<Entity>,
    pub(crate) options: SentenceOptions,
}

impl Default for Sentence {
    fn default() -> Self {
        Self::new(SentenceOptions::default())
    }
}

impl Sentence {
    pub fn new(options: SentenceOptions) -> Self {
        let mut world = World::new();
        let root = world.spawn((TokenKind::Root, Indices::root()));
        Self {
            world,
            root,
            order: Vec::new(),
            options,
        }
    }

    /// Build a sentence from the format layer's records.
    ///
    /// Records are checked with the same rules as the edit operations; nothing
    /// is returned unless the whole snapshot is valid.
    pub fn from_snapshot(snapshot: &SentenceSnapshot) -> Result<Self, GraphError> {
        let mut sentence = Sentence::new(SentenceOptions { enhanced: snapshot.enhanced });
        let records = &snapshot.tokens;

        // 1. Spawn every token; `flat[n]` is the token with absolute index n
        let mut flat = vec![sentence.root];
        let mut i = 0;
        while i < records.len() {
            let record = &records[i];
            match record.kind {
                RecordKind::Word => {
                    let token = sentence.spawn_word(record, TokenKind::Plain);
                    sentence.order.push(token);
                    flat.push(token);
                    i += 1;
                }
                RecordKind::MultiWord { span } => {
                    let span = span as usize;
                    if span == 0 || i + span >= records.len() {
                        return Err(GraphError::InvalidState("multiword span exceeds the sentence"));
                    }
                    if !record.heads.is_empty() {
                        return Err(GraphError::InvalidTarget("multiword tokens carry no heads"));
                    }

                    let sup = sentence.world.spawn((
                        TokenKind::Super { members: Vec::new() },
                        TokenData::word(record.form.clone()),
                        Indices::default(),
                    ));
                    flat.push(sup);

                    let mut members = Vec::with_capacity(span);
                    for member in &records[i + 1..=i + span] {
                        if member.kind != RecordKind::Word {
                            return Err(GraphError::InvalidState("multiword tokens cannot nest"));
                        }
                        if member.is_empty {
                            return Err(GraphError::InvalidState("empty nodes cannot sit inside a multiword token"));
                        }
                        let token = sentence.spawn_word(member, TokenKind::Sub { parent: sup });
                        members.push(token);
                        flat.push(token);
                    }
                    sentence.set_kind(sup, TokenKind::Super { members });
                    sentence.order.push(sup);
                    i += span + 1;
                }
            }
        }

        // 2. Resolve head references now that every token exists
        for (pos, record) in records.iter().enumerate() {
            if record.heads.is_empty() {
                continue;
            }
            let dependent = flat[pos + 1];
            let mut heads = Heads::default();
            for head_record in &record.heads {
                let head = *flat
                    .get(head_record.head as usize)
                    .ok_or(GraphError::InvalidTarget("head index out of range"))?;
                if head == dependent {
                    return Err(GraphError::SelfLoop);
                }
                if matches!(sentence.kind_of(head)?, TokenKind::Sub { .. }) {
                    return Err(GraphError::InvalidTarget("sub-tokens cannot be heads"));
                }
                if sentence.super_token_of(dependent) == Some(head) {
                    return Err(GraphError::InvalidTarget("a sub-token cannot depend on its own multiword token"));
                }
                if heads.contains(head) {
                    return Err(GraphError::DuplicateEdge);
                }
                heads.0.push(Head {
                    token: head,
                    deprel: head_record.deprel.clone(),
                    enhanced: !heads.0.is_empty(),
                });
            }
            if let Ok(mut slot) = sentence.world.get::<&mut Heads>(dependent) {
                *slot = heads;
            }
        }

        sentence.reindex();
        tracing::debug!(tokens = records.len(), "loaded sentence from snapshot");
        Ok(sentence)
    }

    /// The canonical record of this sentence, in flattened order.
    pub fn to_snapshot(&self) -> SentenceSnapshot {
        let tokens = self
            .tokens()
            .into_iter()
            .map(|token| {
                let data = self.data(token).unwrap_or_default();
                let kind = match self.kind(token) {
                    Some(TokenKind::Super { members }) => RecordKind::MultiWord {
                        span: members.len() as u32,
                    },
                    _ => RecordKind::Word,
                };
                let heads = self
                    .heads(token)
                    .into_iter()
                    .map(|head| HeadRecord {
                        head: self.absolute(head.token),
                        deprel: head.deprel,
                    })
                    .collect();

                TokenRecord {
                    form: data.form,
                    upostag: data.upostag,
                    xpostag: data.xpostag,
                    is_empty: data.is_empty,
                    kind,
                    heads,
                }
            })
            .collect();

        SentenceSnapshot {
            enhanced: self.options.enhanced,
            tokens,
        }
    }

    /// Append a word at the end of the sentence
    pub fn push(&mut self, data: TokenData) -> TokenRef {
        let token = self.world.spawn((TokenKind::Plain, data, Heads::default(), Indices::default()));
        self.order.push(token);
        self.reindex();
        token
    }

    /// Append a multiword token together with its member words
    pub fn push_multiword(
        &mut self,
        form: impl Into<String>,
        words: Vec<TokenData>,
    ) -> Result<(TokenRef, Vec<TokenRef>), GraphError> {
        if words.is_empty() {
            return Err(GraphError::InvalidState("a multiword token needs members"));
        }
        if words.iter().any(|data| data.is_empty) {
            return Err(GraphError::InvalidState("empty nodes cannot sit inside a multiword token"));
        }

        let sup = self.world.spawn((
            TokenKind::Super { members: Vec::new() },
            TokenData::word(form),
            Indices::default(),
        ));
        let members: Vec<Entity> = words
            .into_iter()
            .map(|data| {
                self.world.spawn((TokenKind::Sub { parent: sup }, data, Heads::default(), Indices::default()))
            })
            .collect();
        self.set_kind(sup, TokenKind::Super { members: members.clone() });
        self.order.push(sup);
        self.reindex();
        Ok((sup, members))
    }

    pub fn options(&self) -> SentenceOptions {
        self.options
    }

    pub fn is_enhanced(&self) -> bool {
        self.options.enhanced
    }

    /// Switch enhanced mode. Stored edges are kept either way.
    pub fn set_enhanced(&mut self, enhanced: bool) {
        self.options.enhanced = enhanced;
    }

    pub fn root(&self) -> TokenRef {
        self.root
    }

    pub fn contains(&self, token: TokenRef) -> bool {
        self.world.contains(token)
    }

    /// Number of tokens, excluding the root.
    pub fn len(&self) -> usize {
        self.tokens().len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Top-level lexical units: plain words and multiword tokens.
    pub fn units(&self) -> &[TokenRef] {
        &self.order
    }

    /// Every token except the root, in flattened sentence order.
    pub fn tokens(&self) -> Vec<TokenRef> {
        let mut out = Vec::with_capacity(self.order.len());
        for &unit in &self.order {
            out.push(unit);
            if let Some(TokenKind::Super { members }) = self.kind(unit) {
                out.extend(members);
            }
        }
        out
    }

    pub fn token(&self, token: TokenRef) -> Option<TokenView> {
        Some(TokenView {
            kind: self.kind(token)?,
            data: self.data(token).unwrap_or_default(),
            indices: self.indices(token)?,
            heads: self.heads(token),
        })
    }

    pub fn kind(&self, token: TokenRef) -> Option<TokenKind> {
        self.world.get::<&TokenKind>(token).ok().map(|kind| (*kind).clone())
    }

    pub fn data(&self, token: TokenRef) -> Option<TokenData> {
        self.world.get::<&TokenData>(token).ok().map(|data| (*data).clone())
    }

    pub fn form(&self, token: TokenRef) -> Option<String> {
        self.world.get::<&TokenData>(token).ok().map(|data| data.form.clone())
    }

    pub fn indices(&self, token: TokenRef) -> Option<Indices> {
        self.world.get::<&Indices>(token).ok().map(|indices| *indices)
    }

    /// All edges of `token`, primary first. Empty for the root and multiword tokens.
    pub fn heads(&self, token: TokenRef) -> Vec<Head> {
        self.world
            .get::<&Heads>(token)
            .map(|heads| heads.0.clone())
            .unwrap_or_default()
    }

    pub fn primary_head(&self, token: TokenRef) -> Option<Head> {
        self.world
            .get::<&Heads>(token)
            .ok()
            .and_then(|heads| heads.primary().cloned())
    }

    /// Tokens holding any edge to the root, in sentence order.
    pub fn root_dependents(&self) -> Vec<TokenRef> {
        self.tokens()
            .into_iter()
            .filter(|&token| {
                self.world
                    .get::<&Heads>(token)
                    .map(|heads| heads.contains(self.root))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Tokens whose heads include `head`, in sentence order.
    pub fn dependents(&self, head: TokenRef) -> Vec<TokenRef> {
        self.tokens()
            .into_iter()
            .filter(|&token| {
                self.world
                    .get::<&Heads>(token)
                    .map(|heads| heads.contains(head))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn super_token_of(&self, token: TokenRef) -> Option<TokenRef> {
        match self.kind(token)? {
            TokenKind::Sub { parent } => Some(parent),
            _ => None,
        }
    }

    pub fn members(&self, token: TokenRef) -> Vec<TokenRef> {
        match self.kind(token) {
            Some(TokenKind::Super { members }) => members,
            _ => Vec::new(),
        }
    }

    pub fn token_at(&self, absolute: u32) -> Option<TokenRef> {
        if absolute == 0 {
            return Some(self.root);
        }
        self.tokens().get(absolute as usize - 1).copied()
    }

    /// Label of `token` in the requested numbering scheme.
    pub fn index_label(&self, token: TokenRef, format: IndexFormat) -> Option<String> {
        self.indices(token)?.label(format)
    }

    /// Reverse of [`Sentence::index_label`].
    pub fn find_by_label(&self, label: &str, format: IndexFormat) -> Option<TokenRef> {
        std::iter::once(self.root)
            .chain(self.tokens())
            .find(|&token| {
                self.indices(token)
                    .is_some_and(|indices| indices.matches(label, format))
            })
    }

    pub(crate) fn absolute(&self, token: TokenRef) -> u32 {
        self.indices(token).map(|indices| indices.absolute).unwrap_or_default()
    }

    pub(crate) fn kind_of(&self, token: TokenRef) -> Result<TokenKind, GraphError> {
        self.kind(token)
            .ok_or(GraphError::InvalidTarget("token does not belong to this sentence"))
    }

    /// Index of a top-level unit in `order`.
    pub(crate) fn position(&self, token: TokenRef) -> Option<usize> {
        self.order.iter().position(|&unit| unit == token)
    }

    pub(crate) fn set_kind(&mut self, token: TokenRef, kind: TokenKind) {
        if let Ok(mut slot) = self.world.get::<&mut TokenKind>(token) {
            *slot = kind;
        }
    }

    pub(crate) fn reindex(&mut self) {
        reindex::run(&self.world, &self.order);
    }

    fn spawn_word(&mut self, record: &TokenRecord, kind: TokenKind) -> Entity {
        let data = TokenData {
            form: record.form.clone(),
            upostag: record.upostag.clone(),
            xpostag: record.xpostag.clone(),
            is_empty: record.is_empty,
        };
        self.world.spawn((kind, data, Heads::default(), Indices::default()))
    }
}
