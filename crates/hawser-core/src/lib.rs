pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod resolver;
pub mod transport;
pub mod url_model;

pub use config::HawserConfig;
pub use error::DownloadError;
pub use metadata::{LinkRelation, ObjectMetadata};
pub use resolver::{download, Classification, Download, Resolver};
