use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RoleError {
    /// A role set with no members has no rank
    #[error("Role set is empty")]
    EmptyRoleSet,

    #[error("Role lookup failed, unknown role ids: {missing:?}")]
    RoleLookupFailed { missing: Vec<i64> },

    #[error("Role already exists: {name}")]
    DuplicateRoleName { name: String },
}
