//! Backend-agnostic data access for Hoster: the [`Store`] trait, pagination,
//! filtering, and the error taxonomy every backend reports through.
//!
//! Concrete backends (currently `hoster-data-sqlx`) implement [`Store`]
//! against the table/column shape the schema registry describes; nothing
//! in this crate knows about SQL.

pub mod codec;
pub mod error;
pub mod filter;
pub mod page;
pub mod reference_id;
pub mod store;

pub use codec::{coerce_bool, parse_timestamp};
pub use error::DataError;
pub use filter::{Filter, ListQuery};
pub use page::{Page, Pagination, DEFAULT_LIMIT, MAX_LIMIT};
pub use reference_id::new_reference_id;
pub use store::{Store, TransitionOutcome};
