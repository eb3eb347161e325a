pub mod config;
pub mod disease_sh;
pub mod error;
pub mod format;
pub mod history;
pub mod http_client;
pub mod map_view;
pub mod model;
pub mod provider;
pub mod ranking;
pub mod selection;
pub mod source;
pub mod state;
pub mod stats_store;
