/// Where an operation was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSource {
    /// HTTP layer handing over a resolved session user
    API,

    /// Administrative CLI command
    CLI,

    /// Automated operations (bootstrap, maintenance)
    System,
}
