//! Unit tests over library functions, using the shared fixtures.

mod metrics;
mod rule1;
