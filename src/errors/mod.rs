// Errors layer - Error type definitions
pub mod admin;
pub mod internal;

// Re-exports for convenience
pub use admin::{AdminError, SelfModification};
pub use internal::InternalError;
