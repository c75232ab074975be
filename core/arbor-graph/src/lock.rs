//! Advisory editing lock of the local user.
//!
//! The coordinator only remembers which element the local user holds, keeps
//! that choice in the preferences blob so it survives a reload, and queues
//! lock/unlock events for the collaboration transport. Remote locks are
//! cached as reported; nothing here enforces exclusion across users.

use std::collections::{BTreeMap, HashMap};

use arbor_protocol::{LockStyle, SentenceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::systems::projection::Projection;

/// Key of the graph section inside the preferences store.
pub const PREFS_KEY: &str = "graph";

/// Class put on elements another user is editing.
pub const LOCKED_CLASS: &str = "locked";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("malformed preferences blob: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Opaque string storage provided by the host (local storage, a file, ...).
pub trait PrefsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPrefs {
    entries: HashMap<String, String>,
}

impl PrefsStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pan {
    pub x: f64,
    pub y: f64,
}

/// Persisted view state of the graph panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphPrefs {
    pub pan: Option<Pan>,
    pub zoom: Option<f64>,
    pub locked_index: Option<SentenceId>,
    pub locked_id: Option<String>,
    pub locked_classes: Option<String>,
}

impl GraphPrefs {
    pub fn from_blob(blob: &str) -> Result<Self, PrefsError> {
        Ok(serde_json::from_str(blob)?)
    }

    pub fn to_blob(&self) -> Result<String, PrefsError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    pub element_id: String,
    pub sentence: SentenceId,
    pub style: LockStyle,
}

/// Message exchanged with the collaboration transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LockEvent {
    Lock { element_id: String, sentence: SentenceId },
    Unlock,
}

pub struct LockCoordinator<S: PrefsStore> {
    store: S,
    prefs: GraphPrefs,
    online: bool,
    outbox: Vec<LockEvent>,
    /// user -> (sentence, element id)
    remote: BTreeMap<String, (SentenceId, String)>,
}

impl<S: PrefsStore> LockCoordinator<S> {
    /// Restore persisted state from `store`. A corrupt blob is ignored.
    pub fn new(store: S) -> Self {
        let prefs = match store.get(PREFS_KEY) {
            Some(blob) => GraphPrefs::from_blob(&blob).unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored graph preferences: {}", e);
                GraphPrefs::default()
            }),
            None => GraphPrefs::default(),
        };

        Self {
            store,
            prefs,
            online: false,
            outbox: Vec::new(),
            remote: BTreeMap::new(),
        }
    }

    /// Events are only queued while online.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn prefs(&self) -> &GraphPrefs {
        &self.prefs
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current(&self) -> Option<Lock> {
        Some(Lock {
            element_id: self.prefs.locked_id.clone()?,
            sentence: self.prefs.locked_index?,
            style: LockStyle::from_classes(
                self.prefs.locked_classes.as_deref().unwrap_or_default().split_whitespace(),
            ),
        })
    }

    /// Take the lock on `element_id`. Only lockable style classes are remembered.
    pub fn lock<'a>(
        &mut self,
        element_id: &str,
        sentence: SentenceId,
        classes: impl IntoIterator<Item = &'a str>,
    ) {
        if element_id.is_empty() {
            return self.unlock();
        }

        let style = LockStyle::from_classes(classes);
        self.prefs.locked_index = Some(sentence);
        self.prefs.locked_id = Some(element_id.to_string());
        self.prefs.locked_classes = Some(style.class_names().join(" "));
        self.save();

        tracing::debug!(element_id, %sentence, "locked element");
        self.emit(LockEvent::Lock {
            element_id: element_id.to_string(),
            sentence,
        });
    }

    pub fn unlock(&mut self) {
        self.prefs.locked_index = None;
        self.prefs.locked_id = None;
        self.prefs.locked_classes = None;
        self.save();

        tracing::debug!("released lock");
        self.emit(LockEvent::Unlock);
    }

    pub fn set_viewport(&mut self, pan: Pan, zoom: f64) {
        self.prefs.pan = Some(pan);
        self.prefs.zoom = Some(zoom);
        self.save();
    }

    /// Re-apply lock styling to a freshly built projection.
    ///
    /// Elements are regenerated on every redraw, so the recorded classes are
    /// put back by id. A lock whose element disappeared is released.
    pub fn reapply(&mut self, projection: &mut Projection, sentence: SentenceId) {
        if let Some(lock) = self.current().filter(|lock| lock.sentence == sentence) {
            match projection.element_by_id_mut(&lock.element_id) {
                Some(element) => {
                    let classes = lock.style.class_names();
                    for class in &classes {
                        element.add_class(class);
                    }
                    self.lock(&lock.element_id, sentence, classes);
                }
                None => {
                    tracing::warn!("Locked element {} is gone, releasing lock", lock.element_id);
                    self.unlock();
                }
            }
        }

        for (held_sentence, element_id) in self.remote.values() {
            if *held_sentence != sentence {
                continue;
            }
            if let Some(element) = projection.element_by_id_mut(element_id) {
                element.add_class(LOCKED_CLASS);
            }
        }
    }

    /// Record a lock event reported by another user.
    pub fn apply_remote(&mut self, user: &str, event: LockEvent) {
        match event {
            LockEvent::Lock { element_id, sentence } => {
                self.remote.insert(user.to_string(), (sentence, element_id));
            }
            LockEvent::Unlock => {
                self.remote.remove(user);
            }
        }
    }

    /// Element ids other users hold on `sentence`.
    pub fn remote_locks(&self, sentence: SentenceId) -> Vec<&str> {
        self.remote
            .values()
            .filter(|(held, _)| *held == sentence)
            .map(|(_, element_id)| element_id.as_str())
            .collect()
    }

    /// Drop a local lock that belongs to another sentence.
    pub fn reset_for_sentence(&mut self, sentence: SentenceId) {
        if self.prefs.locked_index.is_some_and(|held| held != sentence) {
            self.unlock();
        }
    }

    /// Drain queued events for the transport.
    pub fn take_outbox(&mut self) -> Vec<LockEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn emit(&mut self, event: LockEvent) {
        if self.online {
            self.outbox.push(event);
        }
    }

    fn save(&mut self) {
        match self.prefs.to_blob() {
            Ok(blob) => self.store.set(PREFS_KEY, blob),
            Err(e) => tracing::warn!("Failed to save graph preferences: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TokenData;
    use crate::sentence::Sentence;
    use crate::systems::projection::{project, ProjectionOptions, Unvalidated};

    fn projected() -> (Sentence, Projection) {
        let mut sentence = Sentence::default();
        let a = sentence.push(TokenData::word("a"));
        let b = sentence.push(TokenData::word("b"));
        sentence.add_head(a, b, Some("det")).unwrap();
        let projection = project(&sentence, &ProjectionOptions::default(), &Unvalidated);
        (sentence, projection)
    }

    #[test]
    fn test_lock_persists_and_broadcasts() {
        let mut locks = LockCoordinator::new(MemoryPrefs::default());
        locks.set_online(true);
        locks.lock("form-1", SentenceId(3), ["form", "activated", "root"]);

        let lock = locks.current().unwrap();
        assert_eq!(lock.element_id, "form-1");
        assert_eq!(lock.style, LockStyle::ACTIVATED);
        assert_eq!(
            locks.take_outbox(),
            vec![LockEvent::Lock { element_id: "form-1".to_string(), sentence: SentenceId(3) }]
        );

        // A reload restores the lock from the store
        let restored = LockCoordinator::new(locks.store().clone());
        assert_eq!(restored.current(), Some(lock));

        locks.unlock();
        assert_eq!(locks.current(), None);
        assert_eq!(locks.take_outbox(), vec![LockEvent::Unlock]);
    }

    #[test]
    fn test_offline_queues_nothing() {
        let mut locks = LockCoordinator::new(MemoryPrefs::default());
        locks.lock("form-1", SentenceId(0), ["selected"]);
        locks.lock("", SentenceId(0), ["selected"]);
        assert!(locks.current().is_none());
        assert!(locks.take_outbox().is_empty());
    }

    #[test]
    fn test_reapply_after_redraw() {
        let (_, mut projection) = projected();
        let mut locks = LockCoordinator::new(MemoryPrefs::default());
        locks.lock("dep_1_2", SentenceId(1), ["selected", "dependency"]);
        locks.apply_remote("alice", LockEvent::Lock { element_id: "form-2".to_string(), sentence: SentenceId(1) });
        locks.apply_remote("bob", LockEvent::Lock { element_id: "form-1".to_string(), sentence: SentenceId(7) });

        locks.reapply(&mut projection, SentenceId(1));
        assert!(projection.element_by_id("dep_1_2").unwrap().has_class("selected"));
        assert!(projection.element_by_id("form-2").unwrap().has_class(LOCKED_CLASS));
        assert!(!projection.element_by_id("form-1").unwrap().has_class(LOCKED_CLASS));
        assert_eq!(locks.remote_locks(SentenceId(1)), vec!["form-2"]);

        locks.apply_remote("alice", LockEvent::Unlock);
        assert!(locks.remote_locks(SentenceId(1)).is_empty());
    }

    #[test]
    fn test_reapply_other_sentence_leaves_projection_alone() {
        let (_, mut projection) = projected();
        let pristine = projection.clone();
        let mut locks = LockCoordinator::new(MemoryPrefs::default());
        locks.lock("form-1", SentenceId(4), ["activated"]);

        locks.reapply(&mut projection, SentenceId(5));
        assert_eq!(projection, pristine);
        assert!(locks.current().is_some());

        locks.reset_for_sentence(SentenceId(5));
        assert!(locks.current().is_none());
    }

    #[test]
    fn test_vanished_element_releases_lock() {
        let (_, mut projection) = projected();
        let mut locks = LockCoordinator::new(MemoryPrefs::default());
        locks.lock("form-9", SentenceId(0), ["activated"]);
        locks.reapply(&mut projection, SentenceId(0));
        assert!(locks.current().is_none());
    }

    #[test]
    fn test_corrupt_blob_is_ignored() {
        let mut store = MemoryPrefs::default();
        store.set(PREFS_KEY, "{not json".to_string());
        let mut locks = LockCoordinator::new(store);
        assert_eq!(locks.prefs(), &GraphPrefs::default());

        locks.set_viewport(Pan { x: 10.0, y: -4.0 }, 1.5);
        let saved = GraphPrefs::from_blob(&locks.store().get(PREFS_KEY).unwrap()).unwrap();
        assert_eq!(saved.zoom, Some(1.5));
        assert_eq!(saved.locked_id, None);
    }
}
