pub mod document;
mod models;
mod role;

pub use document::Document;
pub use models::*;
pub use role::{Privilege, Role, RoleGrant, effective_privileges};
