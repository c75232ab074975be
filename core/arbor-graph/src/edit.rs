//! Mutation operations of the token graph.
//!
//! Every operation validates first and only then touches the world, so an
//! `Err` always leaves the sentence untouched. Operations that change the
//! shape of the sentence re-index it before returning.

use arbor_protocol::Indices;
use hecs::Entity;

use crate::components::{Head, Heads, TokenData, TokenKind, TokenRef};
use crate::error::GraphError;
use crate::sentence::Sentence;

pub const ROOT_DEPREL: &str = "root";

/// Editable token attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Form,
    Upostag,
    Xpostag,
}

fn label(deprel: Option<&str>) -> Option<String> {
    deprel
        .map(str::trim)
        .filter(|deprel| !deprel.is_empty())
        .map(String::from)
}

impl Sentence {
    /// Attach `dependent` to `head`.
    ///
    /// Outside enhanced mode this replaces the current primary head. In
    /// enhanced mode the edge is appended as a secondary dependency.
    pub fn add_head(
        &mut self,
        dependent: TokenRef,
        head: TokenRef,
        deprel: Option<&str>,
    ) -> Result<(), GraphError> {
        self.check_edge(dependent, head)?;
        let enhanced = self.options.enhanced;
        if enhanced && self.heads(dependent).iter().any(|h| h.token == head) {
            return Err(GraphError::DuplicateEdge);
        }

        let mut heads = self.heads_mut(dependent)?;
        let edge = Head {
            token: head,
            deprel: label(deprel),
            enhanced: false,
        };
        if enhanced || heads.0.is_empty() {
            heads.0.push(edge);
        } else {
            let rest: Vec<Head> = heads.0.drain(1..).filter(|h| h.token != head).collect();
            heads.0[0] = edge;
            heads.0.extend(rest);
        }
        heads.normalize();
        drop(heads);

        tracing::debug!(?dependent, ?head, enhanced, "added head");
        Ok(())
    }

    /// Relabel the existing edge `dependent -> head`.
    pub fn modify_head(
        &mut self,
        dependent: TokenRef,
        head: TokenRef,
        deprel: &str,
    ) -> Result<(), GraphError> {
        let mut heads = self.heads_mut(dependent)?;
        let i = heads.position(head).ok_or(GraphError::NoSuchEdge)?;
        heads.0[i].deprel = label(Some(deprel));
        drop(heads);

        tracing::debug!(?dependent, ?head, deprel, "relabelled head");
        Ok(())
    }

    /// Delete the edge `dependent -> head`. The dependent may end up unattached.
    pub fn remove_head(&mut self, dependent: TokenRef, head: TokenRef) -> Result<(), GraphError> {
        let mut heads = self.heads_mut(dependent)?;
        let i = heads.position(head).ok_or(GraphError::NoSuchEdge)?;
        heads.remove_at(i);
        drop(heads);

        tracing::debug!(?dependent, ?head, "removed head");
        Ok(())
    }

    /// Attach `token` to the root. Outside enhanced mode every other root edge
    /// is dropped first, so the root keeps a single dependent.
    pub fn set_root(&mut self, token: TokenRef, deprel: Option<&str>) -> Result<(), GraphError> {
        let root = self.root;
        self.check_edge(token, root)?;
        if self.options.enhanced {
            return self.add_head(token, root, Some(deprel.unwrap_or(ROOT_DEPREL)));
        }

        for (dependent, heads) in self.world.query_mut::<&mut Heads>() {
            if dependent == token {
                continue;
            }
            if let Some(i) = heads.position(root) {
                heads.remove_at(i);
            }
        }
        self.add_head(token, root, Some(deprel.unwrap_or(ROOT_DEPREL)))
    }

    /// Mark a word as an empty (elided) node, or turn it back into a regular word.
    /// Members of a multiword token can only be turned back.
    pub fn set_empty(&mut self, token: TokenRef, is_empty: bool) -> Result<(), GraphError> {
        match self.kind_of(token)? {
            TokenKind::Super { .. } => {
                return Err(GraphError::InvalidState("multiword tokens cannot be empty"))
            }
            TokenKind::Root => return Err(GraphError::InvalidState("the root cannot be empty")),
            TokenKind::Sub { .. } if is_empty => {
                return Err(GraphError::InvalidState("empty nodes cannot sit inside a multiword token"))
            }
            TokenKind::Plain | TokenKind::Sub { .. } => {}
        }

        if let Ok(mut data) = self.world.get::<&mut TokenData>(token) {
            data.is_empty = is_empty;
        }
        self.reindex();

        tracing::debug!(?token, is_empty, "toggled empty node");
        Ok(())
    }

    /// Insert a new word right after `anchor`.
    ///
    /// After the root means first. After a sub-token means after its whole
    /// multiword token.
    pub fn insert_after(&mut self, anchor: TokenRef, data: TokenData) -> Result<TokenRef, GraphError> {
        let at = match self.kind_of(anchor)? {
            TokenKind::Root => 0,
            TokenKind::Sub { parent } => self.unit_position(parent)? + 1,
            TokenKind::Plain | TokenKind::Super { .. } => self.unit_position(anchor)? + 1,
        };

        let token = self.world.spawn((TokenKind::Plain, data, Heads::default(), Indices::default()));
        self.order.insert(at, token);
        self.reindex();

        tracing::debug!(?anchor, ?token, "inserted token");
        Ok(token)
    }

    /// Split a word at a character offset, or dissolve a multiword token.
    ///
    /// Returns the resulting tokens in sentence order.
    pub fn split(&mut self, token: TokenRef, offset: Option<usize>) -> Result<Vec<TokenRef>, GraphError> {
        match (self.kind_of(token)?, offset) {
            (TokenKind::Plain, Some(offset)) | (TokenKind::Sub { .. }, Some(offset)) => {
                self.split_form(token, offset)
            }
            (TokenKind::Super { members }, None) => self.dissolve(token, members),
            (TokenKind::Super { .. }, Some(_)) => {
                Err(GraphError::InvalidTarget("a multiword token is split without an offset"))
            }
            (TokenKind::Root, _) => Err(GraphError::InvalidTarget("the root cannot be split")),
            (_, None) => Err(GraphError::InvalidTarget("splitting a word needs an offset")),
        }
    }

    /// Group two neighbouring words into a new multiword token.
    pub fn combine(&mut self, a: TokenRef, b: TokenRef) -> Result<TokenRef, GraphError> {
        let (first, second) = self.adjacent_pair(a, b)?;
        if [first, second].iter().any(|&t| self.data(t).is_some_and(|data| data.is_empty)) {
            return Err(GraphError::InvalidState("empty nodes cannot sit inside a multiword token"));
        }
        let form = self.joined_form(first, second);
        let at = self.unit_position(first)?;

        let sup = self.world.spawn((
            TokenKind::Super { members: vec![first, second] },
            TokenData::word(form),
            Indices::default(),
        ));
        self.set_kind(first, TokenKind::Sub { parent: sup });
        self.set_kind(second, TokenKind::Sub { parent: sup });
        self.order[at] = sup;
        self.order.remove(at + 1);

        // Sub-tokens cannot be heads, their multiword token takes the edges
        self.repoint_heads(first, sup, &[first, second]);
        self.repoint_heads(second, sup, &[first, second]);
        self.reindex();

        tracing::debug!(?first, ?second, ?sup, "combined tokens");
        Ok(sup)
    }

    /// Collapse two neighbouring words into `b`.
    pub fn merge(&mut self, a: TokenRef, b: TokenRef) -> Result<TokenRef, GraphError> {
        let (first, second) = self.adjacent_pair(a, b)?;
        let form = self.joined_form(first, second);
        let absorbed = self.data(a).unwrap_or_default();

        let a_heads: Vec<Head> = self
            .heads(a)
            .into_iter()
            .filter(|head| head.token != b)
            .collect();
        {
            let mut heads = self.heads_mut(b)?;
            heads.0.retain(|h| h.token != a);
            if self.options.enhanced || heads.0.is_empty() {
                for head in a_heads {
                    if !heads.contains(head.token) {
                        heads.0.push(head);
                    }
                }
            }
            heads.normalize();
        }
        if let Ok(mut data) = self.world.get::<&mut TokenData>(b) {
            data.form = form;
            if data.upostag.is_none() {
                data.upostag = absorbed.upostag;
            }
            if data.xpostag.is_none() {
                data.xpostag = absorbed.xpostag;
            }
        }

        self.order.retain(|&unit| unit != a);
        self.repoint_heads(a, b, &[b]);
        let _ = self.world.despawn(a);
        self.reindex();

        tracing::debug!(?a, ?b, "merged tokens");
        Ok(b)
    }

    /// Commit an edited label.
    pub fn set_attribute(&mut self, token: TokenRef, attr: Attribute, value: &str) -> Result<(), GraphError> {
        match (self.kind_of(token)?, attr) {
            (TokenKind::Root, _) => return Err(GraphError::InvalidTarget("the root has no attributes")),
            (TokenKind::Super { .. }, Attribute::Upostag | Attribute::Xpostag) => {
                return Err(GraphError::InvalidTarget("multiword tokens carry no tags"))
            }
            _ => {}
        }

        let value = value.trim();
        let tag = (!value.is_empty()).then(|| value.to_string());
        if let Ok(mut data) = self.world.get::<&mut TokenData>(token) {
            match attr {
                Attribute::Form => data.form = tag.unwrap_or_else(|| "_".to_string()),
                Attribute::Upostag => data.upostag = tag,
                Attribute::Xpostag => data.xpostag = tag,
            }
        }

        tracing::debug!(?token, ?attr, value, "set attribute");
        Ok(())
    }

    fn split_form(&mut self, token: TokenRef, offset: usize) -> Result<Vec<TokenRef>, GraphError> {
        let form = self.form(token).unwrap_or_default();
        let chars: Vec<char> = form.chars().collect();
        if offset > chars.len() {
            return Err(GraphError::InvalidState("split offset is past the end of the form"));
        }
        let left: String = chars[..offset].iter().collect::<String>().trim().to_string();
        let right: String = chars[offset..].iter().collect::<String>().trim().to_string();
        if left.is_empty() || right.is_empty() {
            return Err(GraphError::InvalidState("split would leave an empty token"));
        }

        let kind = self.kind_of(token)?;
        let is_empty = self.data(token).map(|data| data.is_empty).unwrap_or(false);
        let second = self.world.spawn((
            kind.clone(),
            TokenData { form: right, is_empty, ..TokenData::default() },
            Heads::default(),
            Indices::default(),
        ));

        match kind {
            TokenKind::Sub { parent } => {
                if let Ok(mut parent_kind) = self.world.get::<&mut TokenKind>(parent) {
                    if let TokenKind::Super { members } = &mut *parent_kind {
                        let at = members.iter().position(|&m| m == token).map_or(members.len(), |i| i + 1);
                        members.insert(at, second);
                    }
                }
            }
            _ => {
                let at = self.unit_position(token)?;
                self.order.insert(at + 1, second);
            }
        }
        if let Ok(mut data) = self.world.get::<&mut TokenData>(token) {
            data.form = left;
        }
        self.reindex();

        tracing::debug!(?token, ?second, offset, "split token");
        Ok(vec![token, second])
    }

    fn dissolve(&mut self, sup: TokenRef, members: Vec<Entity>) -> Result<Vec<TokenRef>, GraphError> {
        let at = self.unit_position(sup)?;
        for &member in &members {
            self.set_kind(member, TokenKind::Plain);
        }
        self.order.splice(at..=at, members.iter().copied());
        if let Some(&first) = members.first() {
            self.repoint_heads(sup, first, &[first]);
        }
        let _ = self.world.despawn(sup);
        self.reindex();

        tracing::debug!(?sup, members = members.len(), "dissolved multiword token");
        Ok(members)
    }

    /// Move every edge pointing at `from` over to `to`. Dependents listed in
    /// `dropping` lose the edge instead, as do dependents already attached to `to`.
    fn repoint_heads(&mut self, from: Entity, to: Entity, dropping: &[Entity]) {
        for (dependent, heads) in self.world.query_mut::<&mut Heads>() {
            if !heads.contains(from) {
                continue;
            }
            let drop_edge = dropping.contains(&dependent) || heads.contains(to);
            if drop_edge {
                heads.0.retain(|h| h.token != from);
            } else {
                for head in heads.0.iter_mut().filter(|h| h.token == from) {
                    head.token = to;
                }
            }
            heads.normalize();
        }
    }

    /// Both tokens must be top-level words next to each other; returns them in sentence order.
    fn adjacent_pair(&self, a: TokenRef, b: TokenRef) -> Result<(TokenRef, TokenRef), GraphError> {
        for token in [a, b] {
            if self.kind_of(token)? != TokenKind::Plain {
                return Err(GraphError::InvalidTarget("only top-level words can be joined"));
            }
        }
        if a == b {
            return Err(GraphError::NotAdjacent);
        }
        let (pa, pb) = (self.unit_position(a)?, self.unit_position(b)?);
        match pb.checked_sub(pa) {
            Some(1) => Ok((a, b)),
            _ if pa.checked_sub(pb) == Some(1) => Ok((b, a)),
            _ => Err(GraphError::NotAdjacent),
        }
    }

    fn joined_form(&self, first: TokenRef, second: TokenRef) -> String {
        let mut form = self.form(first).unwrap_or_default();
        form.push_str(&self.form(second).unwrap_or_default());
        form
    }

    fn unit_position(&self, token: TokenRef) -> Result<usize, GraphError> {
        self.position(token)
            .ok_or(GraphError::InvalidTarget("token is not a top-level unit"))
    }

    fn heads_mut(&self, token: TokenRef) -> Result<hecs::RefMut<'_, Heads>, GraphError> {
        if !self.world.contains(token) {
            return Err(GraphError::InvalidTarget("token does not belong to this sentence"));
        }
        self.world.get::<&mut Heads>(token).map_err(|_| GraphError::NoSuchEdge)
    }

    fn check_edge(&self, dependent: TokenRef, head: TokenRef) -> Result<(), GraphError> {
        if dependent == head {
            return Err(GraphError::SelfLoop);
        }
        match self.kind_of(head)? {
            TokenKind::Sub { .. } => {
                return Err(GraphError::InvalidTarget("sub-tokens cannot be heads"))
            }
            TokenKind::Root | TokenKind::Plain | TokenKind::Super { .. } => {}
        }
        match self.kind_of(dependent)? {
            TokenKind::Sub { parent } if parent == head => {
                Err(GraphError::InvalidTarget("a sub-token cannot depend on its own multiword token"))
            }
            TokenKind::Plain | TokenKind::Sub { .. } => Ok(()),
            TokenKind::Root => Err(GraphError::InvalidTarget("the root cannot have heads")),
            TokenKind::Super { .. } => {
                Err(GraphError::InvalidTarget("multiword tokens carry no heads"))
            }
        }
    }
}
