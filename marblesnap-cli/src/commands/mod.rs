//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`capture`] - Single capture of a region
//! - [`init`] - Configuration initialization
//! - [`timelapse`] - Animated GIF from saved captures
//! - [`watch`] - Scheduled captures until interrupted

pub mod capture;
pub mod common;
pub mod init;
pub mod prompt;
pub mod timelapse;
pub mod watch;
