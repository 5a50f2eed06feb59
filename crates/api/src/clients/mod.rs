//! Outbound adapters for remote services.

pub mod user;

pub use user::HttpUserClient;
