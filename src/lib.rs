pub mod cli;
pub mod config;
pub mod errors;
pub mod index;
pub mod output;
pub mod parse;
pub mod query;
pub mod walk;
