#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// exact euclidean distance transforms and distance fields.
pub mod distance_transform;

/// module containing parallelization utilities.
pub mod parallel;
