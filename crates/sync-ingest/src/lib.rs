#![forbid(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod service;
pub mod validate;

pub use config::IngestConfig;
pub use dispatcher::Dispatcher;
pub use error::IngestError;
pub use service::{IngestService, parse_operation};
pub use validate::BatchValidator;
