//! Session-related types for the identity gate.
//!
//! Types stored in the server-side session for authentication state.

use serde::{Deserialize, Serialize};

use shopfloor_core::{BasketId, Role, UserId};

/// Session-stored identity, created at login and cleared at logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Role granted by the identity gate.
    pub role: Role,
    /// Registered customer id (absent for admins).
    pub user_id: Option<UserId>,
    /// The customer's basket (absent for admins).
    pub basket_id: Option<BasketId>,
    /// Name shown in the page header.
    pub display_name: String,
}

impl SessionContext {
    /// Context for the store administrator.
    #[must_use]
    pub fn admin(display_name: impl Into<String>) -> Self {
        Self {
            role: Role::Admin,
            user_id: None,
            basket_id: None,
            display_name: display_name.into(),
        }
    }

    /// Context for a freshly registered customer.
    #[must_use]
    pub fn customer(user_id: UserId, basket_id: BasketId, display_name: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            user_id: Some(user_id),
            basket_id: Some(basket_id),
            display_name: display_name.into(),
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this session may act on `basket_id`.
    #[must_use]
    pub fn can_access_basket(&self, basket_id: &BasketId) -> bool {
        self.is_admin() || self.basket_id.as_ref() == Some(basket_id)
    }
}

/// Session keys for identity data.
pub mod keys {
    /// Key for storing the current session context.
    pub const CURRENT_SESSION: &str = "current_session";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_can_only_touch_own_basket() {
        let ctx = SessionContext::customer(UserId::new("user_1"), BasketId::new("basket_a"), "Jo");
        assert!(ctx.can_access_basket(&BasketId::new("basket_a")));
        assert!(!ctx.can_access_basket(&BasketId::new("basket_b")));
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_admin_reaches_every_basket() {
        let ctx = SessionContext::admin("Admin");
        assert!(ctx.can_access_basket(&BasketId::new("basket_z")));
        assert_eq!(ctx.user_id, None);
    }
}
