pub mod config;
pub mod db;
pub mod dispatch;
pub mod matching;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod price;
pub mod registry;
pub mod scheduler;
pub mod store;

pub mod error;
pub mod logger;
pub mod time;
