//! Who may do what. Every role and ownership rule of the service lives here so
//! handlers only ask questions and map the answers to HTTP errors.

use crate::auth::repo_types::Role;

/// Only admins may choose a post's `author` and `weight`.
pub fn can_write_owner_fields(role: Role) -> bool {
    role.is_admin()
}

/// Admins may modify any post, everyone else only their own.
pub fn can_modify_post(requester_id: i64, role: Role, post_owner_id: i64) -> bool {
    role.is_admin() || post_owner_id == requester_id
}

/// Gate for the user-moderation routes.
pub fn can_administer(role: Role) -> bool {
    role.is_admin()
}

pub fn can_promote(role: Role) -> bool {
    can_administer(role)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoteDenied {
    /// Requester is not the superadmin.
    NotSuperadmin,
    /// The superadmin tried to demote itself.
    SelfDemotion,
}

pub fn is_superadmin(requester_id: i64, superadmin_id: i64) -> bool {
    requester_id == superadmin_id
}

pub fn check_demote(requester_id: i64, target_id: i64, superadmin_id: i64) -> Result<(), DemoteDenied> {
    if !is_superadmin(requester_id, superadmin_id) {
        return Err(DemoteDenied::NotSuperadmin);
    }
    if target_id == requester_id {
        return Err(DemoteDenied::SelfDemotion);
    }
    Ok(())
}

/// The very first account becomes the admin.
pub fn initial_role_for(existing_user_count: i64) -> Role {
    if existing_user_count == 0 {
        Role::Admin
    } else {
        Role::User
    }
}
