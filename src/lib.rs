// Library exports for the binary, integration tests and the HTTP layer

pub mod app_data;
pub mod cache;
pub mod cli;
pub mod config;
pub mod coordinators;
pub mod errors;
pub mod providers;
pub mod stores;
pub mod types;

#[cfg(test)]
pub mod test;

pub use app_data::AppData;
