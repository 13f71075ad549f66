//! L-system trees: grammar expansion, then turtle interpretation into a
//! tapered-cylinder skeleton with leaf-attachment tips.

pub mod cylinder;
pub mod grammar;
pub mod turtle;

pub use grammar::{Grammar, TreeType};
pub use turtle::{build_skeleton, BranchShape, BranchTip, TreeSkeleton, TurtleParams, TurtleStats};
