//! Tradebook Library
//!
//! Trading journal and investment consortium backend: spot and futures trade
//! logs, floating holdings, PnL statistics, and proportional profit
//! allocation across pooled investors, served over a JSON HTTP API.

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod persistence;
pub mod rate_limit;
pub mod secrets;
