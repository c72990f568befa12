//! Custom Axum extractors.

pub mod actor;
pub mod pagination;
pub mod path;

pub use actor::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER, Actor};
pub use pagination::PaginationParams;
pub use path::parse_id;
