mod common;
mod filter;
mod metrics;
mod run;
