//! CogniTask: task hierarchy and prioritization engine, served over MCP.
//!
//! This module exports the core components for testing and integration.

pub mod assistant;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod tools;
pub mod types;
pub mod validation;
