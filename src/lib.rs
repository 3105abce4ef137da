pub mod app_error;
pub mod app_state;
pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod datetime;
pub mod db;
pub mod models;
pub mod money;
pub mod pagination;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;
pub mod transitions;
pub mod validation;
