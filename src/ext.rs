//! Public extension points: refresh notifications and request signing.

pub mod refresh_hook;
pub mod request_signer;

pub use refresh_hook::*;
pub use request_signer::*;
