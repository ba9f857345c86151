use crate::error::ApiError;
use crate::model::role::Role;

/// Effective row visibility for a store query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeScope {
    All,
    One(u64),
}

/// Resolves the caller's requested filter against their role, before any
/// store query runs, so pagination totals cannot leak other employees'
/// rows. Privileged roles always see everything; everyone else is pinned
/// to their own employee id no matter what they asked for.
pub fn effective_scope(
    role: Role,
    caller_employee_id: Option<u64>,
    requested: Option<u64>,
) -> Result<EmployeeScope, ApiError> {
    if role.is_privileged() {
        return Ok(EmployeeScope::All);
    }

    let own = caller_employee_id.ok_or(ApiError::Forbidden)?;

    if let Some(requested) = requested {
        if requested != own {
            tracing::debug!(
                requested,
                own,
                "unprivileged caller asked for another employee's records, pinning to own"
            );
        }
    }

    Ok(EmployeeScope::One(own))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privileged_roles_see_all_regardless_of_request() {
        for role in [Role::Admin, Role::Hr, Role::System] {
            assert_eq!(
                effective_scope(role, Some(7), Some(42)).unwrap(),
                EmployeeScope::All
            );
            assert_eq!(effective_scope(role, None, None).unwrap(), EmployeeScope::All);
        }
    }

    #[test]
    fn unprivileged_callers_are_pinned_to_their_own_id() {
        assert_eq!(
            effective_scope(Role::Employee, Some(7), None).unwrap(),
            EmployeeScope::One(7)
        );
        // Requesting someone else's id does not widen the scope.
        assert_eq!(
            effective_scope(Role::Employee, Some(7), Some(42)).unwrap(),
            EmployeeScope::One(7)
        );
    }

    #[test]
    fn unprivileged_caller_without_employee_link_is_rejected() {
        assert!(matches!(
            effective_scope(Role::ApiUser, None, None),
            Err(ApiError::Forbidden)
        ));
    }
}
