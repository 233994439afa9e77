//! Text-driven multi-track synthesis
//!
//! A `MusicComposer` takes note and control tokens one at a time, renders
//! notes with an FM voice, applies echo and equalization per track and
//! mixes all tracks into the final music.

pub mod composer;
pub mod config;
pub mod error;
pub mod generator;
pub mod signal;
pub mod wav;

pub use composer::MusicComposer;
pub use config::ComposerConfig;
pub use error::{ComposeError, ConfigError, ScriptError};
pub use signal::AudioSignal;
