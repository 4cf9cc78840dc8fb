//! Accumulation of wizard answers.

pub mod merge;
pub mod patch;
pub mod store;

pub use merge::Merge;
pub use patch::{FormPatch, PatchError};
pub use store::FormStateStore;
