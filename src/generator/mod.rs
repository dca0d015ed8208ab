//! Directory tree generation (the write workload)
//!
//! - [`shape`]: tree parameters, naming, and expected totals
//! - [`tree`]: the level-barrier generator built on the worker pool

pub mod shape;
pub mod tree;

pub use shape::TreeShape;
pub use tree::{FileWriter, GenerateProgress, GenerateResult, TreeGenerator};
