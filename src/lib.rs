//! hubkit - repository operations for GitHub as callable tools
//!
//! hubkit exposes branch creation, file reads and writes, batched
//! multi-file commits, issue, pull request and gist management, and search
//! as a closed set of tools with JSON schemas, backed by the GitHub REST API.
//!
//! # Architecture
//!
//! - [`core`] - Validated domain types and configuration
//! - [`forge`] - Remote API traits, the GitHub client, and an in-memory mock
//! - [`ops`] - Multi-step Git object orchestration (resolve, write, publish)
//! - [`tools`] - Tool catalog, typed call parsing and dispatch
//! - [`cli`] - Command-line interface (`tools`, `call`, `serve`)
//!
//! # Publishing Guarantee
//!
//! A batch publish creates a tree and a commit and then fast-forwards the
//! branch. The branch either moves to the new commit or stays where it was;
//! readers never observe a partially applied batch.

pub mod cli;
pub mod core;
pub mod forge;
pub mod ops;
pub mod tools;
