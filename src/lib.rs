pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod meta;
pub mod output;
pub mod portal;
pub mod router;
pub mod sanitize;
pub mod utils;

#[cfg(test)]
mod tests;
