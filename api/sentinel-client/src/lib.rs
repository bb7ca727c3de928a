pub mod client;
pub mod error;
pub mod token_store;
pub mod types;
pub mod views;
