//! cli::commands
//!
//! Command handlers.
//!
//! Each handler writes its result as JSON to stdout. Errors are returned
//! to [`crate::cli::run`] and reported on stderr with a non-zero exit, except
//! in `serve`, where each failing call becomes an `error` line instead.

mod call;
mod serve;
mod tools;

pub use call::call;
pub use serve::{handle_line, serve};
pub use tools::tools;
