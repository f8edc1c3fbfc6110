// Data models for the rep analysis core

pub mod event;
pub mod landmark;
pub mod recording;
pub mod reference_model;
pub mod score;
pub mod trajectory;

pub use event::*;
pub use landmark::*;
pub use recording::*;
pub use reference_model::*;
pub use score::*;
pub use trajectory::*;
