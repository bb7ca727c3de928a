pub mod controller;
pub mod crud;
pub mod model;
pub mod route;
pub mod schema;
