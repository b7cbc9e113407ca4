// Request and response shapes exchanged with the HTTP layer
pub mod auth;
pub mod user;
