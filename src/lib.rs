// Library exports for penlog
// This allows integration tests and external code to use penlog modules

pub mod auth;
pub mod avatar;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod forms;
pub mod routes;
pub mod state;
