//! Core library for the weather advisory service.
//!
//! This crate defines:
//! - Configuration handling
//! - The advisory sources (free-text bulletin, coded forecast) behind one trait
//! - The fallback resolver that always yields a record
//! - A client-side time-boxed cache and the inbound HTTP endpoint
//!
//! It is used by `advisory-cli`, but can also be embedded in other services.

pub mod cache;
pub mod config;
pub mod model;
pub mod resolver;
pub mod server;
pub mod source;

pub use cache::AdvisoryCache;
pub use config::Config;
pub use model::{Condition, WeatherAdvisory};
pub use resolver::{AdvisoryResolver, resolver_from_config};
pub use source::{AdvisorySource, SourceId};
