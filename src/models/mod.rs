pub mod booking;
pub mod contact;
pub mod location;
pub mod service;
pub mod validate;

pub use booking::{
    Address, Booking, BookingRequest, BookingStatus, Car, Customer, NewBooking, Payment,
    PaymentMethod, PaymentStatus, Schedule, ServiceSnapshot,
};
pub use contact::ContactMessage;
pub use location::{Coordinates, Location, LocationInput};
pub use service::{Service, ServiceInput};
