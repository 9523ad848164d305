pub mod balance;
pub mod client;
pub mod holding;
pub mod trade;
