pub mod analysis;
pub mod api;
pub mod database;
pub mod models;
pub mod statements;
pub mod utils;
