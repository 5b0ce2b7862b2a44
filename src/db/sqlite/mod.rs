pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;
pub mod sqlite_service;
