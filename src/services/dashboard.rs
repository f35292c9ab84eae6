use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::DerivedStatus;
use crate::services::bookings::BookingView;
use crate::services::ledger::saturating_add;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DashboardStats {
    pub confirmed_count: usize,
    pub completed_count: usize,
    pub cancelled_count: usize,
    pub total_collected: Decimal,
    /// Outstanding balance across bookings that are not cancelled.
    pub total_pending: Decimal,
}

pub fn summarize(views: &[BookingView]) -> DashboardStats {
    views.iter().fold(DashboardStats::default(), |mut stats, view| {
        match view.derived_status {
            DerivedStatus::Confirmed => stats.confirmed_count += 1,
            DerivedStatus::Completed => stats.completed_count += 1,
            DerivedStatus::Cancelled => stats.cancelled_count += 1,
        }
        stats.total_collected = saturating_add(stats.total_collected, view.summary.total_paid);
        if view.derived_status != DerivedStatus::Cancelled {
            stats.total_pending = saturating_add(stats.total_pending, view.summary.pending);
        }
        stats
    })
}
