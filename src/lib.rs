pub mod app;
pub mod assistant;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod filter;
pub mod logging;
pub mod selection;
pub mod state;
pub mod storage;
pub mod types;
pub mod view;

#[cfg(feature = "ui")]
pub mod ui;
