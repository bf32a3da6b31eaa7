//! Layered JSON5 settings for memedash: where the API lives, how often the
//! leaderboard polls, history defaults, report size, toast lifetime and the
//! storage file.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{API_URL_ENV, ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
pub use model::*;
