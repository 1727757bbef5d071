//! Issued token records and their secret wrappers.

pub mod record;
pub mod secret;
