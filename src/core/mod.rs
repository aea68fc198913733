pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod provider;
pub mod registry;

pub use dispatcher::{Dispatcher, Resolved, Selection};
pub use error::{DefinitionError, ExtractError, FetchError, ResolveError};
pub use extractor::{Extractor, ExtractorShape, PageLocation, ResolveContext};
pub use fetch::{Fetch, FetchRequest, FetchResponse, HttpFetcher, Method};
pub use provider::{CapturePattern, MatchGroups, ProviderDescriptor, ProviderStatus, Reliability};
pub use registry::Registry;
