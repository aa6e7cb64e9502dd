//! Translator feature
//!
//! Batch translation of text layers through a chat-completion API, the
//! history of completed batches, and replaying a stored batch onto a fresh
//! clone of its subject.

pub mod batch;
pub mod history;
pub mod invoker;
pub mod languages;
pub mod regenerate;

pub use batch::{BatchOptions, BatchOrchestrator, BatchOutcome, ProgressTracker};
pub use history::{HistoryStore, MAX_RECORDS};
pub use invoker::{ChatCompletionClient, TranslationInvoker};
pub use languages::{detect_language, supported_languages};
pub use regenerate::{find_match, MatchRule, RegenerateOptions, RegenerateOutcome, Regenerator};
