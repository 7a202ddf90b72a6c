//! Domain model: work items, identifiers and upload outcomes.

pub mod ids;
pub mod item;
pub mod outcome;

pub use ids::ItemId;
pub use item::WorkItem;
pub use outcome::{OutcomeKind, UploadOutcome};
