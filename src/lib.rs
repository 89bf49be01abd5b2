pub mod checker;
pub mod classifier;
pub mod config;
pub mod dns;
pub mod domain;
pub mod error;
pub mod http_server;
pub mod model;
pub mod query;
pub mod response;
pub mod shutdown;
pub mod validation;

pub use checker::DnssecChecker;
pub use config::CheckerConfig;
pub use dns::DNSPacket;
