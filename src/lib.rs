//! Helpdesk Assist: onboarding progress store and helpdesk tools.

pub mod config;
pub mod context;
pub mod error;
pub mod knowledge;
pub mod onboarding;
pub mod server;
pub mod store;
pub mod tools;
