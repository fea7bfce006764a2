pub mod booking;
pub mod contact;
pub mod gateway;
pub mod notify;
pub mod payment;
