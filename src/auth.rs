//! Token models and redacted secrets.

pub mod token;

pub use token::{record::*, secret::*};
