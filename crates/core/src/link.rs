//! Clip link classification.

/// Host token every clip link must carry.
pub const DOMAIN_TOKEN: &str = "faceit.com";
/// Path marker preceding the player nickname.
pub const PLAYER_SEGMENT: &str = "/players/";
/// Path marker preceding the clip identifier.
pub const VIDEO_SEGMENT: &str = "/videos/";

/// A message that passed classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipReference {
	pub raw_url: String,
	pub clip_id: String,
}

/// Classifies message text as a clip link.
///
/// All of scheme, domain token, player and video markers must be present.
/// The text is taken as-is; the identifier is everything after the last
/// `/`, unvalidated.
pub fn classify(raw: &str) -> Option<ClipReference> {
	let has_scheme = raw.starts_with("http://") || raw.starts_with("https://");

	if !(has_scheme && raw.contains(DOMAIN_TOKEN) && raw.contains(PLAYER_SEGMENT) && raw.contains(VIDEO_SEGMENT)) {
		return None;
	}

	let clip_id = raw.rsplit('/').next().unwrap_or_default();
	Some(ClipReference {
		raw_url: raw.to_string(),
		clip_id: clip_id.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	const VALID: &str = "https://www.faceit.com/en/players/someone/videos/abc123";

	#[test]
	fn canonical_link_is_classified() {
		let clip = classify(VALID).unwrap();
		assert_eq!(clip.clip_id, "abc123");
		assert_eq!(clip.raw_url, VALID);
	}

	#[test]
	fn wrong_domain_is_rejected() {
		assert_eq!(classify("https://example.com/players/x/videos/1"), None);
	}

	#[test]
	fn each_marker_is_required() {
		for text in [
			"www.faceit.com/en/players/someone/videos/abc123",
			"ftp://www.faceit.com/en/players/someone/videos/abc123",
			"https://www.example.org/en/players/someone/videos/abc123",
			"https://www.faceit.com/en/someone/videos/abc123",
			"https://www.faceit.com/en/players/someone/abc123",
			"",
			"hello there",
		] {
			assert_eq!(classify(text), None, "{text:?} should not classify");
		}
	}

	#[test]
	fn plain_http_is_accepted() {
		assert!(classify("http://faceit.com/players/a/videos/b").is_some());
	}

	#[test]
	fn identifier_is_last_segment_verbatim() {
		let clip = classify("https://www.faceit.com/players/x/videos/a%20b?t=1").unwrap();
		assert_eq!(clip.clip_id, "a%20b?t=1");

		let trailing = classify("https://www.faceit.com/players/x/videos/").unwrap();
		assert_eq!(trailing.clip_id, "");
	}

	#[test]
	fn text_is_taken_verbatim() {
		let clip = classify(&format!("{VALID} ")).unwrap();
		assert_eq!(clip.raw_url, format!("{VALID} "));
		assert_eq!(clip.clip_id, "abc123 ");

		assert_eq!(classify(&format!(" {VALID}")), None);
	}

	#[test]
	fn classification_is_idempotent() {
		for text in [VALID, "https://example.com/players/x/videos/1", "not a link"] {
			assert_eq!(classify(text), classify(text));
		}
	}
}
