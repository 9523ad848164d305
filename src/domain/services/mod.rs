pub mod allocation;
pub mod calendar;
pub mod portfolio;
pub mod statistics;
