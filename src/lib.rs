pub mod database;
pub mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod web;
