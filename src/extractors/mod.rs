//! Extraction strategies shared by the provider table.
//!
//! Every provider resolves through one of these shapes:
//! [`Passthrough`] when the pattern already isolates the URL, [`Template`] or
//! [`Rot47`] for pure transforms of the captured tokens, and [`JsonApi`] when
//! one follow-up request is needed.

pub mod api;
pub mod passthrough;
pub mod rot47;
pub mod template;

pub use api::{FieldPath, JsonApi};
pub use passthrough::Passthrough;
pub use rot47::{rot47, Rot47};
pub use template::{Template, UrlTemplate};
