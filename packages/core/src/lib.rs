// Library root: exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod config;
pub mod coupon;
pub mod error;
pub mod filter;
pub mod message;
pub mod provider;
pub mod publisher;
pub mod run;
pub mod selector;
pub mod services;
pub mod state;
pub mod sync;

// Only used by the binary.
pub mod cli;
pub mod logging;
