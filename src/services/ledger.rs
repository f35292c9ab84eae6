use rust_decimal::Decimal;

use crate::models::{Payment, PaymentSummary, PaymentType};

/// Amounts closer than this to the pending balance settle it in full.
pub fn settle_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Largest amount accepted for a booking total, a payment, or a package price.
pub fn max_amount() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

/// Net paid, pending balance, and progress of one booking from raw payment rows.
/// Rows belonging to other bookings are ignored. Sums saturate instead of overflowing.
pub fn summarize(booking_id: &str, total_amount: Decimal, payments: &[Payment]) -> PaymentSummary {
    let mut gross_paid = Decimal::ZERO;
    let mut gross_refunded = Decimal::ZERO;

    for p in payments.iter().filter(|p| p.booking_id == booking_id) {
        match p.payment_type {
            PaymentType::Refund => {
                gross_refunded = saturating_add(gross_refunded, p.refund_amount.unwrap_or(p.amount))
            }
            _ => gross_paid = saturating_add(gross_paid, p.amount),
        }
    }

    let total_paid = gross_paid
        .checked_sub(gross_refunded)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);
    let total_amount = total_amount.max(Decimal::ZERO);
    let pending = total_amount
        .checked_sub(total_paid)
        .unwrap_or(Decimal::ZERO)
        .clamp(Decimal::ZERO, total_amount);
    let payment_progress = if total_amount > Decimal::ZERO {
        total_paid
            .checked_div(total_amount)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ONE_HUNDRED)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            .round_dp(2)
    } else {
        Decimal::ZERO
    };

    PaymentSummary {
        total_paid,
        pending,
        total_amount,
        payment_progress,
    }
}

pub(crate) fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(if b.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Type of a payment being recorded against `pending`, the balance before it.
pub fn classify(amount: Decimal, pending: Decimal, is_advance: bool) -> PaymentType {
    if is_advance {
        PaymentType::Advance
    } else if amount
        .checked_sub(pending)
        .map_or(false, |diff| diff.abs() < settle_tolerance())
    {
        PaymentType::Full
    } else if amount < pending {
        PaymentType::Partial
    } else {
        PaymentType::Overpaid
    }
}
