// SPDX-License-Identifier: MIT

//! Application layer around the engine
//!
//! - `nodes` - builtin node kinds
//! - `definition` / `loader` / `builder` - YAML/JSON workflow files
//! - `server` - HTTP front end
//! - `config` - server settings from the environment

pub mod builder;
pub mod condition;
pub mod config;
pub mod definition;
pub mod error;
pub mod loader;
pub mod nodes;
pub mod server;

pub use builder::Builder;
pub use config::ServerConfig;
pub use definition::{Dependencies, EdgeDef, NodeDef, WorkflowDef};
pub use error::FlowError;
pub use loader::WorkflowLoader;
