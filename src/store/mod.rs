//! Persistent keyed store for smiley records.
//!
//! This module provides SQLite-based persistence for smileys: the text
//! shortcut is the primary key, the cached image payload lives alongside
//! it, and every commit is serialized through one connection. Commits
//! that insert records publish typed notifications, which is what drives
//! the auto-sync mode in [`crate::sync`].

pub mod db;
pub mod error;
pub mod events;
pub mod schema;
pub mod types;

pub use db::{SmileyStore, SqliteSmileyStore};
pub use error::StoreError;
pub use events::CommitEvent;
pub use types::{SmileyKey, SmileyRecord};
