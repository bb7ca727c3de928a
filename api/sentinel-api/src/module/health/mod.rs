pub mod controller;
pub mod route;
pub mod schema;
