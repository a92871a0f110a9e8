//! Current user and role policy
//!
//! The signed-in user is an explicit value handed to whatever needs it; there
//! is no ambient session. Admin checks go through an injectable `RolePolicy`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The signed-in user as provided by the authentication layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", alias = "photoUrl")]
    pub photo_url: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Decides whether a user may use admin features
pub trait RolePolicy: Send + Sync {
    fn is_admin(&self, user: Option<&User>) -> bool;

    /// `None` when nobody is signed in
    fn role(&self, user: Option<&User>) -> Option<Role> {
        let user = user?;
        Some(if self.is_admin(Some(user)) { Role::Admin } else { Role::User })
    }
}

/// Any `Fn(&User) -> bool` is a policy; signed-out users are never admins
impl<F> RolePolicy for F
where
    F: Fn(&User) -> bool + Send + Sync,
{
    fn is_admin(&self, user: Option<&User>) -> bool {
        user.is_some_and(|u| self(u))
    }
}

/// Admin allow-list with an explicit development override
#[derive(Debug, Clone, Default)]
pub struct AllowListPolicy {
    admin_emails: HashSet<String>,
    development_override: bool,
}

impl AllowListPolicy {
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admin_emails = admin_emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            admin_emails,
            development_override: false,
        }
    }

    /// Grant admin to every signed-in user (local development only)
    pub fn with_development_override(mut self, enabled: bool) -> Self {
        if enabled {
            log::warn!("Development admin override enabled: every signed-in user is an admin");
        }
        self.development_override = enabled;
        self
    }

    pub fn admin_count(&self) -> usize {
        self.admin_emails.len()
    }
}

impl RolePolicy for AllowListPolicy {
    fn is_admin(&self, user: Option<&User>) -> bool {
        let Some(user) = user else {
            return false;
        };

        let email = user.email.trim().to_lowercase();
        if email.is_empty() {
            return false;
        }

        self.development_override || self.admin_emails.contains(&email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AllowListPolicy {
        AllowListPolicy::new(["admin@altrion.com", " Demo@Altrion.com "])
    }

    #[test]
    fn test_allow_list_is_case_insensitive_exact_match() {
        let policy = policy();
        assert!(policy.is_admin(Some(&User::new("ADMIN@altrion.com"))));
        assert!(policy.is_admin(Some(&User::new("demo@altrion.com"))));
        assert_eq!(policy.admin_count(), 2);
    }

    #[test]
    fn test_substring_of_admin_is_not_admin() {
        let policy = policy();
        assert!(!policy.is_admin(Some(&User::new("admin.fan@example.com"))));
        assert!(!policy.is_admin(Some(&User::new("demo-user@example.com"))));
    }

    #[test]
    fn test_signed_out_and_blank_email() {
        let policy = policy().with_development_override(true);
        assert!(!policy.is_admin(None));
        assert!(!policy.is_admin(Some(&User::new("  "))));
        assert_eq!(policy.role(None), None);
    }

    #[test]
    fn test_development_override_grants_signed_in_users() {
        let policy = policy().with_development_override(true);
        assert!(policy.is_admin(Some(&User::new("learner@example.com"))));
    }

    #[test]
    fn test_roles() {
        let policy = policy();
        assert_eq!(policy.role(Some(&User::new("admin@altrion.com"))), Some(Role::Admin));
        assert_eq!(policy.role(Some(&User::new("learner@example.com"))), Some(Role::User));
    }

    #[test]
    fn test_closure_policy() {
        let deny_all = |_: &User| false;
        let allow_all = |_: &User| true;
        let user = User::new("admin@altrion.com");

        assert!(!deny_all.is_admin(Some(&user)));
        assert!(allow_all.is_admin(Some(&user)));
        assert!(!allow_all.is_admin(None));
    }

    #[test]
    fn test_user_decodes_auth_provider_shape() {
        let user: User = serde_json::from_str(
            r#"{"email":"a@b.com","displayName":"A","photoURL":"https://p/1.png"}"#,
        )
        .unwrap();
        assert_eq!(user.display_name.as_deref(), Some("A"));
        assert_eq!(user.photo_url.as_deref(), Some("https://p/1.png"));
    }
}
