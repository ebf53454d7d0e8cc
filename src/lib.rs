pub mod config;
pub mod demo_feed;
pub mod fixture;
pub mod football_data;
pub mod history_store;
pub mod http_cache;
pub mod http_client;
pub mod ingest;
pub mod league;
pub mod logging;
pub mod match_record;
pub mod provider;
pub mod rate_format;
pub mod recent_matches;
pub mod report;
pub mod state;
pub mod stats;
pub mod stats_export;
