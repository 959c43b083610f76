//! Core business logic for papershare.

pub mod services;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use services::*;
