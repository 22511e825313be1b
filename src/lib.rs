pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod exit_codes;
pub mod filter;
pub mod item;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod prerequisite;
pub mod report;
pub mod runner;
pub mod server;
pub mod sink;
pub mod source;
pub mod throttle;
