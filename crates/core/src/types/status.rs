//! Status enums for baskets, sessions and payments.
//!
//! # Basket lifecycle
//!
//! ```text
//! PendingCashierApproval ──approve──▶ Active ──▶ Completed
//!          │                            │
//!          └────────────▶ Inactive ◀────┘
//! ```
//!
//! Only `approve` is driven by the cashier board. `Completed` and `Inactive`
//! are reached through administrative edits.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "basket_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BasketStatus {
    /// Created at registration, waiting for a cashier.
    #[default]
    PendingCashierApproval,
    /// Approved by a cashier; the customer is shopping.
    Active,
    /// Order fulfilled.
    Completed,
    /// Disabled basket.
    Inactive,
}

impl BasketStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::PendingCashierApproval,
        Self::Active,
        Self::Completed,
        Self::Inactive,
    ];

    /// Human-readable label shown on the cashier board.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingCashierApproval => "Pending cashier approval",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Inactive => "Inactive",
        }
    }

    /// Storage name (matches the `basket_status` enum in the database).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingCashierApproval => "pending_cashier_approval",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Inactive => "inactive",
        }
    }

    /// Whether no further transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Inactive)
    }

    /// Whether the cashier board lists baskets in this status.
    #[must_use]
    pub const fn is_listed(self) -> bool {
        !matches!(self, Self::Completed)
    }

    /// Whether products may still be added to the basket.
    #[must_use]
    pub const fn accepts_items(self) -> bool {
        matches!(self, Self::PendingCashierApproval | Self::Active)
    }

    /// Result of a cashier approval from this status.
    ///
    /// Returns `None` when approval does not apply, in which case the basket
    /// must be left untouched.
    #[must_use]
    pub const fn approve(self) -> Option<Self> {
        match self {
            Self::PendingCashierApproval => Some(Self::Active),
            Self::Active | Self::Completed | Self::Inactive => None,
        }
    }

    /// Whether `next` is a forward move in the lifecycle.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::PendingCashierApproval,
                Self::Active | Self::Inactive
            ) | (Self::Active, Self::Completed | Self::Inactive)
        )
    }
}

impl std::fmt::Display for BasketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for BasketStatus {
    type Err = String;

    /// Accepts both the storage name and the display label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| {
                status.as_str().eq_ignore_ascii_case(wanted)
                    || status.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| format!("invalid basket status: {s}"))
    }
}

/// Role granted by the identity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Store staff: dashboard, catalog, printing, approvals.
    Admin,
    /// A registered shopper.
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// How a basket is (or will be) paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_service", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentService {
    #[default]
    None,
    Cash,
    Card,
    Upi,
}

impl PaymentService {
    /// Label printed on receipts and the cashier board.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Cash => "Cash",
            Self::Card => "Card",
            Self::Upi => "UPI",
        }
    }
}

impl std::fmt::Display for PaymentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PaymentService {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            _ => Err(format!("invalid payment service: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_baskets_start_pending() {
        assert_eq!(BasketStatus::default(), BasketStatus::PendingCashierApproval);
        assert_eq!(
            BasketStatus::default().to_string(),
            "Pending cashier approval"
        );
    }

    #[test]
    fn test_approve_only_from_pending() {
        assert_eq!(
            BasketStatus::PendingCashierApproval.approve(),
            Some(BasketStatus::Active)
        );
        assert_eq!(BasketStatus::Active.approve(), None);
        assert_eq!(BasketStatus::Completed.approve(), None);
        assert_eq!(BasketStatus::Inactive.approve(), None);
    }

    #[test]
    fn test_forward_transitions() {
        use BasketStatus::*;
        assert!(PendingCashierApproval.can_transition_to(Active));
        assert!(PendingCashierApproval.can_transition_to(Inactive));
        assert!(Active.can_transition_to(Completed));
        assert!(Active.can_transition_to(Inactive));

        assert!(!Active.can_transition_to(PendingCashierApproval));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Inactive.can_transition_to(Active));
        assert!(!PendingCashierApproval.can_transition_to(Completed));
        for status in BasketStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_listing_hides_completed_only() {
        assert!(BasketStatus::PendingCashierApproval.is_listed());
        assert!(BasketStatus::Active.is_listed());
        assert!(BasketStatus::Inactive.is_listed());
        assert!(!BasketStatus::Completed.is_listed());
    }

    #[test]
    fn test_status_parses_label_and_storage_name() {
        assert_eq!(
            "Pending cashier approval".parse::<BasketStatus>().unwrap(),
            BasketStatus::PendingCashierApproval
        );
        assert_eq!(
            "completed".parse::<BasketStatus>().unwrap(),
            BasketStatus::Completed
        );
        assert!("shipped".parse::<BasketStatus>().is_err());
    }

    #[test]
    fn test_status_serde_uses_storage_name() {
        let json = serde_json::to_string(&BasketStatus::PendingCashierApproval).unwrap();
        assert_eq!(json, "\"pending_cashier_approval\"");
    }

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("cashier".parse::<Role>().is_err());
    }

    #[test]
    fn test_payment_service_labels() {
        assert_eq!(PaymentService::default().label(), "None");
        assert_eq!("UPI".parse::<PaymentService>().unwrap(), PaymentService::Upi);
        assert_eq!(PaymentService::Card.to_string(), "Card");
    }
}
