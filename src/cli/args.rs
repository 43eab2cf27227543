//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read this config file instead of the default
//! - `--api-base <url>`: Override the REST API base URL
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hubkit - repository operations for GitHub as callable tools
#[derive(Parser, Debug)]
#[command(name = "hubkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to read (default: $HUBKIT_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// REST API base URL (overrides config and HUBKIT_API_BASE)
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every tool with its input schema
    Tools,

    /// Invoke one tool and print its JSON result
    #[command(after_help = "\
EXAMPLES:
    # Read a file
    hubkit call get_file_contents --args '{\"owner\":\"octocat\",\"repo\":\"hello-world\",\"path\":\"README\"}'

    # Arguments from stdin
    echo '{\"query\":\"language:rust stars:>1000\"}' | hubkit call search_repositories")]
    Call {
        /// Tool name (see `hubkit tools`)
        name: String,

        /// JSON argument object; read from stdin when omitted
        #[arg(long, value_name = "JSON")]
        args: Option<String>,
    },

    /// Answer tool calls read as JSON lines from stdin
    #[command(long_about = "Answer tool calls read as JSON lines from stdin.\n\n\
        Each input line is an object {\"name\": ..., \"arguments\": {...}} with an \
        optional \"id\". Each call produces one output line holding either \
        \"result\" or \"error\", echoing the id. A failing call never stops the loop; \
        end of input does.")]
    Serve,
}
