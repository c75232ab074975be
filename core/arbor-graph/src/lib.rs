pub mod components;
pub mod edit;
pub mod error;
pub mod lock;
pub mod sentence;
pub mod systems;

pub use components::{Head, TokenData, TokenKind, TokenRef};
pub use edit::{Attribute, ROOT_DEPREL};
pub use error::GraphError;
pub use lock::{GraphPrefs, LockCoordinator, LockEvent, MemoryPrefs, Pan, PrefsError, PrefsStore};
pub use sentence::{Sentence, SentenceOptions, TokenView};
pub use systems::projection::{
    project, Classifier, Direction, Element, ElementKind, Progress, Projection, ProjectionOptions, Side,
    Unvalidated,
};
