//! DNS Provider implementations

#[cfg(feature = "route53")]
pub mod route53;

#[cfg(feature = "route53")]
pub use route53::{Route53Api, Route53ApiStub, Route53Provider};
