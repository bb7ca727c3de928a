pub mod auth;
pub mod common;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod health;
pub mod policy;
pub mod realtime;
pub mod violation;
