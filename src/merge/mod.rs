pub mod pipeline;
pub mod rows;
pub mod zoning;
pub mod zoning_use;

pub use pipeline::{run, Collaborators, MediaStage, MergeJob};
