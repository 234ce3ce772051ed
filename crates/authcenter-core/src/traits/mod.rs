//! Core traits defined in `authcenter-core` and implemented by other crates.

pub mod verification;

pub use verification::CodeVerifier;
