pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod record;
pub mod resolver;
pub mod store;
