//! Actor roles.

pub mod role;

pub use role::ActorRole;
