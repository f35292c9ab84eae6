pub mod booking;
pub mod client;
pub mod hhmm;
pub mod package;
pub mod payment;
pub mod venue;

pub use booking::{Booking, BookingInput, BookingStatus, DerivedStatus, EventWindow};
pub use client::{Client, ClientInput};
pub use package::{Package, PackageInput};
pub use payment::{Payment, PaymentInput, PaymentMethod, PaymentSummary, PaymentType};
pub use venue::{Venue, VenueInput};
