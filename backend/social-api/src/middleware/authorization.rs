use crate::config::DeletePolicy;
use crate::error::{AppError, AppResult};
use crate::middleware::guards::AuthenticatedCaller;
use uuid::Uuid;

pub fn require_admin(caller: &AuthenticatedCaller) -> AppResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin role required".into()))
    }
}

/// The caller acts on their own account, or is an admin
pub fn require_self_or_admin(caller: &AuthenticatedCaller, user_id: Uuid) -> AppResult<()> {
    if caller.user_id == user_id || caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("cannot modify another user".into()))
    }
}

pub fn authorize_delete(
    policy: DeletePolicy,
    caller: &AuthenticatedCaller,
    author_id: Uuid,
) -> AppResult<()> {
    match policy {
        DeletePolicy::Any => Ok(()),
        DeletePolicy::AuthorOrAdmin if caller.user_id == author_id || caller.is_admin() => Ok(()),
        DeletePolicy::AuthorOrAdmin => Err(AppError::Forbidden(
            "only the author or an admin may delete this message".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn caller(role: Role) -> AuthenticatedCaller {
        AuthenticatedCaller {
            user_id: Uuid::new_v4(),
            email: "c@example.com".into(),
            roles: vec![role],
        }
    }

    #[test]
    fn test_any_policy_allows_everyone() {
        let member = caller(Role::Member);
        assert!(authorize_delete(DeletePolicy::Any, &member, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_author_or_admin_policy() {
        let member = caller(Role::Member);
        let admin = caller(Role::Admin);
        let other = Uuid::new_v4();

        assert!(authorize_delete(DeletePolicy::AuthorOrAdmin, &member, member.user_id).is_ok());
        assert!(authorize_delete(DeletePolicy::AuthorOrAdmin, &admin, other).is_ok());
        assert!(matches!(
            authorize_delete(DeletePolicy::AuthorOrAdmin, &member, other),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_self_or_admin() {
        let member = caller(Role::Member);
        assert!(require_self_or_admin(&member, member.user_id).is_ok());
        assert!(require_self_or_admin(&member, Uuid::new_v4()).is_err());
        assert!(require_self_or_admin(&caller(Role::Admin), Uuid::new_v4()).is_ok());
        assert!(require_admin(&member).is_err());
    }
}
