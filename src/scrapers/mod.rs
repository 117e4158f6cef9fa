pub mod aggregator;
pub mod extractor;
pub mod site;
pub mod traits;
pub mod types;

pub use aggregator::Aggregator;
pub use site::build_http_client;
