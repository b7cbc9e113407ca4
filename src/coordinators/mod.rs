// Coordinators layer - Workflow orchestration
//
// Coordinators compose stores and providers into the operations exposed to
// the HTTP layer. Each public method is one endpoint's workflow.

pub mod admin_coordinator;
pub mod auth_coordinator;

pub use admin_coordinator::AdminCoordinator;
pub use auth_coordinator::{AuthCoordinator, LoginResponse};


#[cfg(test)]
mod auth_coordinator_test;
