//! Compact range notations.
//!
//! Two independent grammars feed the planner:
//!
//! - **Hostname ranges** such as `nj01pamr[101-106]` or `nj01pamr[101a-101c]`
//!   expand to an ordered list of hostnames.
//! - **Flexible numeric ranges** such as `[1,3,5-10]` expand to a sorted,
//!   deduplicated list of port numbers.
//!
//! Both are pure functions with no side effects.

pub mod flexible;
pub mod hostname;

pub use flexible::{format_flexible_range, parse_flexible_range};
pub use hostname::parse_hostname_range;

/// Errors raised by the range grammars
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("invalid hostname range format '{0}', expected prefix[start-end]")]
    HostnameFormat(String),

    #[error("start ({start}) must be less than or equal to end ({end})")]
    InvertedRange { start: u64, end: u64 },

    #[error("start ({start}) and end ({end}) must have the same length for an alphanumeric range")]
    LengthMismatch { start: String, end: String },

    #[error("'{start}' and '{end}' must share the same base and end in a letter (e.g. 101a-101c)")]
    SuffixMismatch { start: String, end: String },

    #[error("suffix '{start}' sorts after '{end}'")]
    InvertedSuffix { start: char, end: char },

    #[error("invalid range format '{0}', expected [1,3,5-10]")]
    Brackets(String),

    #[error("invalid item '{0}', expected a number or start-end")]
    Item(String),

    #[error("values must be positive integers: '{0}'")]
    NonPositive(String),
}
