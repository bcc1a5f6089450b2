//! Common utilities for loading problems from files.
//!
//! - **`data_loader`**: Parses Matrix Market coordinate files into sparse matrices
//!   and converts them to the other operator formats the solvers accept.

pub mod data_loader;
