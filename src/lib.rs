pub mod app;
pub mod cli;
pub mod config;
pub mod loader;
pub mod output;
pub mod paginator;
pub mod record;
pub mod utils;
pub mod view;

#[cfg(test)]
mod tests;
