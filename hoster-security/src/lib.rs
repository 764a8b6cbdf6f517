//! Request identity resolution for Hoster.
//!
//! Identity comes from trusted headers set by an upstream gateway, with an
//! unverified-JWT-payload fallback for direct callers. Signature
//! verification is deliberately out of scope here — the gateway in front
//! of this service is the trust boundary.

pub mod error;
pub mod extractor;
pub mod gateway;
pub mod header;
pub mod identity;
pub mod jwt;
pub mod plan_limits;

pub use error::SecurityError;
pub use gateway::check_gateway_secret;
pub use header::HeaderGetter;
pub use identity::{resolve, AuthContext};
pub use plan_limits::PlanLimits;
