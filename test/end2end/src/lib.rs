//! End-to-end testing infrastructure for Evently
//!
//! Runs the whole sync engine (cache, commands, debouncer and identity
//! watcher) against an in-process document store and checks what ends up
//! both in the cache and in the store.

pub mod infra;

pub use infra::TestInfrastructure;

#[cfg(test)]
mod tests;
