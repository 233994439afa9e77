//! Token-driven multi-track composition
//!
//! - token: token grammar and script splitting
//! - note_maker: token interpretation and note synthesis
//! - music: track state, effects and the final mix

pub mod music;
pub mod note_maker;
pub mod token;

pub use music::MusicComposer;
pub use note_maker::{Interpretation, NoteMaker};
pub use token::{classify, tokenize, ControlCommand, EqualizeMode, NoteSpec, Token};
