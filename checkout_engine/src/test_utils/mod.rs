//! Helpers for setting up scratch databases and seed data in tests.
pub mod prepare_env;
pub mod seeds;
