pub mod client;
pub mod config;
pub mod domain;
pub mod forms;
pub mod preview;
pub mod routes;
pub mod services;
