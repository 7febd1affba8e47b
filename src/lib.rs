pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod preview;
pub mod report;
pub mod service;
pub mod session;
pub mod workflow;
