use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub tenant_id: String,
    pub booking_id: String,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    /// Only set once the payment has been converted into a refund.
    pub refund_amount: Option<Decimal>,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Fixed when the payment is recorded; never re-derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Full,
    Partial,
    Advance,
    Overpaid,
    Refund,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Full => "full",
            PaymentType::Partial => "partial",
            PaymentType::Advance => "advance",
            PaymentType::Overpaid => "overpaid",
            PaymentType::Refund => "refund",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "full" => Ok(PaymentType::Full),
            "partial" => Ok(PaymentType::Partial),
            "advance" => Ok(PaymentType::Advance),
            "overpaid" => Ok(PaymentType::Overpaid),
            "refund" => Ok(PaymentType::Refund),
            _ => Err(anyhow::anyhow!("unknown payment type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    Razorpay,
    Stripe,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Razorpay => "razorpay",
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "razorpay" => Ok(PaymentMethod::Razorpay),
            "stripe" => Ok(PaymentMethod::Stripe),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(anyhow::anyhow!("unknown payment method: {s}")),
        }
    }
}

/// A payment as entered by the user, before it is classified.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_advance: bool,
}

/// Balance of one booking, recomputed from its payment rows on every read.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_paid: Decimal,
    pub pending: Decimal,
    pub total_amount: Decimal,
    pub payment_progress: Decimal,
}
