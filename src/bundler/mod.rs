//! Script bundling: merge planning, the bundle table, and the bundle URL convention.

pub mod planner;

pub use planner::*;
