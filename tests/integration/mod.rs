//! End-to-end tests over a real SQLite file.

mod pipeline;
mod rule1_store;
