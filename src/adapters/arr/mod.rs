//! *arr application (Radarr, Sonarr, Lidarr, Readarr, Whisparr) adapters.

pub mod client;

pub use client::ArrClient;
