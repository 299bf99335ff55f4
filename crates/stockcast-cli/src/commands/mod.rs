//! CLI Command Implementations
//!
//! - [`serve`]: HTTP model serving
//! - [`predict`]: offline one-shot prediction
//! - [`inspect`]: artifact bundle summary

mod inspect;
mod predict;
mod serve;

pub use inspect::InspectCommand;
pub use predict::PredictCommand;
pub use serve::ServeCommand;
