//! # CLI Module
//!
//! Command-line entry points for the `addsvc` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Run the HTTP server until SIGINT or SIGTERM:
//!
//! ```bash
//! addsvc serve --config addsvc.yaml --addr 127.0.0.1:8081
//! ```
//!
//! ### `sum` / `concat`
//!
//! Call a running instance:
//!
//! ```bash
//! addsvc sum --target localhost:8081 2 3
//! addsvc concat --target http://localhost:8081 foo bar
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands};
