//! HTTP handlers for late-email-service.

pub mod generate;
pub mod health;
pub mod send;

pub use generate::generate;
pub use health::health_check;
pub use send::send_email;
