pub mod context;
pub mod user;

pub use context::{RequestContext, RequestId, RequestSource};
pub use user::{NewUser, Role, RoleStatus, User, UserFilter, UserPage, UserStatus, UserUpdate};
