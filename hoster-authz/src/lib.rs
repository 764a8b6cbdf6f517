//! Authorization policy for Hoster: pure predicates, one per (resource,
//! action), consulted only as a second line of defense after the owner
//! scoping filter already applied at the REST boundary.

pub mod ownership;
pub mod quota;

pub use ownership::{can_view_template, is_owner};
pub use quota::{can_create_deployment, check_resource_envelope};
