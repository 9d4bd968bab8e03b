//! Per-request completion: the wait counter and the response wrapper listeners receive.

pub mod counter;
pub mod handle;

pub use counter::*;
pub use handle::*;
