//! Balancer fixed point arithmetic and pool math.

pub use error::Error;

mod error;
pub mod fixed_point;
pub mod math;
pub mod stable_math;
