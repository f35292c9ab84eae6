pub mod bookings;
pub mod calendar;
pub mod conflicts;
pub mod dashboard;
pub mod ledger;
pub mod status;
