//! Command handlers, one module per subcommand.
//!
//! Each handler translates parsed arguments into calls on the core services
//! and renders the result through [`crate::output::OutputManager`].

pub mod apply;
pub mod completions;
pub mod config;
pub mod init;
pub mod list;
