pub mod build_info;
pub mod cli;
pub mod config;
pub mod logging;
pub mod notion_client;
pub mod reconcile;
pub mod store;
