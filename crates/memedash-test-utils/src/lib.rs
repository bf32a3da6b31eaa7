//! Test helpers shared across memedash crates.

pub mod api;
pub mod fixtures;

pub use api::{FailingApi, ScriptedApi};
pub use fixtures::{meme, meme_with_stats, memes, page};
