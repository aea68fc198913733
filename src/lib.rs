pub mod cli;
pub mod config;
pub mod core;
pub mod extractors;
pub mod providers;
pub mod utils;

pub use crate::core::{
    Dispatcher, Extractor, Fetch, PageLocation, ProviderDescriptor, Registry, Reliability,
    ResolveError, Resolved,
};
pub use crate::extractors::{rot47, JsonApi, Passthrough, Rot47, Template};
