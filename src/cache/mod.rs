// In-process caches shared by providers
pub mod identity_cache;

pub use identity_cache::{FillTicket, IdentityCache};
