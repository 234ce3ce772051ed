//! Sliding-window request throttling.

pub mod limiter;

pub use limiter::{RateLimiters, SlidingWindowLimiter};
