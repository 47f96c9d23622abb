//! URL handling for the scheduler core
//!
//! The frontier and metadata store key everything by normalized URL string.
//! This module is the normalization boundary: link extractors resolve and
//! normalize here before handing URLs to the scheduler.

mod domain;
mod normalize;

pub use domain::{extract_domain, resolve_relative};
pub use normalize::{is_valid, normalize, MAX_URL_LEN};
