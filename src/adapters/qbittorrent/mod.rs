//! qBittorrent Web API adapter.

pub mod client;
pub mod models;

pub use client::QbitClient;
