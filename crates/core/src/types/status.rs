//! Status enums for orders and payments.

use serde::{Deserialize, Serialize};

/// Order fulfillment status reported by the commerce backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Human-readable label for display.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Payment status attached to an order.
///
/// At checkout the status is client-selected (development/testing affordance)
/// rather than derived from a real payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Paid,
    Pending,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Human-readable label for display.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Pending => "Pending",
            Self::Failed => "Failed",
            Self::Refunded => "Refunded",
        }
    }

    /// Whether an order placed with this status should proceed to confirmation.
    #[must_use]
    pub const fn completes_checkout(&self) -> bool {
        matches!(self, Self::Paid | Self::Pending)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(Self::Paid),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).unwrap(),
            "\"paid\""
        );
        let status: PaymentStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, PaymentStatus::Failed);
    }

    #[test]
    fn test_payment_status_from_str() {
        assert_eq!("pending".parse::<PaymentStatus>().unwrap(), PaymentStatus::Pending);
        assert!("cash".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_completes_checkout() {
        assert!(PaymentStatus::Paid.completes_checkout());
        assert!(PaymentStatus::Pending.completes_checkout());
        assert!(!PaymentStatus::Failed.completes_checkout());
    }

    #[test]
    fn test_order_status_serde() {
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(status.label(), "Shipped");
    }
}
