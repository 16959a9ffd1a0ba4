//! Page-scraping resolvers.
//!
//! Both resolvers report through [`Resolution`] so callers can tell "the page
//! rendered but had nothing usable" apart from "the page never rendered".

mod media;
mod title;

pub use media::{DEFAULT_EMBED_TEMPLATE, MEDIA_EXTENSION, MEDIA_TAG, MediaUrlResolver, is_direct_media_url, select_media_url, sources_expression};
pub use title::{TITLE_EXPRESSION, TitleResolver};

use std::time::Duration;

/// Upper bound for a resolver's readiness wait.
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
	Found(T),
	/// The page loaded but held no qualifying value.
	NotFound,
	/// The page could not be loaded or inspected.
	TransientError(String),
}

impl<T> Resolution<T> {
	pub fn found(self) -> Option<T> {
		match self {
			Resolution::Found(value) => Some(value),
			Resolution::NotFound | Resolution::TransientError(_) => None,
		}
	}

	pub fn is_found(&self) -> bool {
		matches!(self, Resolution::Found(_))
	}
}
