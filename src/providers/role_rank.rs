//! Role rank comparison
//!
//! Rank is a role's `sort` value. Lower is more privileged, and a role set
//! ranks as its most privileged member.

use std::collections::BTreeSet;

use crate::errors::internal::RoleError;
use crate::types::internal::Role;

/// Most privileged rank in a non-empty role set
pub fn min_rank(roles: &[Role]) -> Result<i32, RoleError> {
    roles.iter().map(|role| role.sort).min().ok_or(RoleError::EmptyRoleSet)
}

/// `true` iff `a` strictly outranks `b`. Equal ranks are not higher.
pub fn is_strictly_higher(a: &[Role], b: &[Role]) -> Result<bool, RoleError> {
    Ok(min_rank(a)? < min_rank(b)?)
}

/// Set equality of role ids, ignoring order and duplicates
pub fn same_role_set(a: &[i64], b: &[i64]) -> bool {
    let a: BTreeSet<i64> = a.iter().copied().collect();
    let b: BTreeSet<i64> = b.iter().copied().collect();
    a == b
}
