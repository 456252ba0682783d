//! HTTP route handlers

pub mod engagement;
pub mod metrics;
pub mod session;
