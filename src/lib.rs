#![forbid(unsafe_code)]

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod listing;
pub mod loader;
pub mod logging;
pub mod recipe;
pub mod selection;
pub mod shopping;
pub mod storage;
pub mod store;

#[cfg(test)]
mod testing;
