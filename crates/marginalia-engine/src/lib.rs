pub mod anchoring;
pub mod content;
pub mod io;
pub mod models;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use anchoring::{builder::*, error::*, highlights::*, index::*, resolver::*, selector::*};
pub use content::{ContentTree, NodeId, PlainText};
pub use io::*;
pub use models::annotation::*;
