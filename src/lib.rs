pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod schemas;
pub mod services;
pub mod state;
