pub mod accumulator;
pub mod error;
pub mod rolling;
pub mod solver;
pub mod types;

pub use error::SipError;
pub use types::*;

/// Standard result type for all sip-analytics operations
pub type SipResult<T> = Result<T, SipError>;
