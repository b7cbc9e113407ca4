// Providers layer - Work performers composed by coordinators
//
// Providers hold the reusable operations: credential hashing, role rank
// comparison and read-through identity lookup.

pub mod crypto_provider;
pub mod role_rank;
pub mod user_provider;

pub use crypto_provider::{Argon2Hasher, CredentialHasher, generate_secure_password};
pub use user_provider::UserProvider;
