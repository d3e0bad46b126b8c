//! Generic Access Profile ([Vol 3] Part C) identifiers.

pub use uuid::*;

mod uuid;
