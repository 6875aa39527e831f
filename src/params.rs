//! Page query parameters that select the neighborhood to show.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::fetch::FetchError;

/// What the host page asked for. Read once on load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewParams {
	/// Focus entity identifier.
	pub entity: String,
	pub collection: String,
	/// Graph backend variant; passed through to the service untouched.
	pub backend: Option<String>,
	/// Optional theme name.
	pub theme: Option<String>,
	/// Page origin the API path is resolved against, e.g. `https://host:8080`.
	pub origin: String,
}

impl ViewParams {
	/// Parses a `location.search` style string (leading `?` optional).
	/// Empty values count as absent.
	pub fn from_query(search: &str, origin: &str) -> Result<Self, FetchError> {
		let mut entity = None;
		let mut collection = None;
		let mut backend = None;
		let mut theme = None;

		for pair in search.trim_start_matches('?').split('&') {
			let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
			let value = decode(value);
			if value.is_empty() {
				continue;
			}
			match &*decode(key) {
				"entity" => entity = Some(value.into_owned()),
				"collection" | "collection_id" => collection = Some(value.into_owned()),
				"backend" => backend = Some(value.into_owned()),
				"theme" => theme = Some(value.into_owned()),
				_ => {}
			}
		}

		Ok(Self {
			entity: entity.ok_or(FetchError::MissingParameters("entity"))?,
			collection: collection.ok_or(FetchError::MissingParameters("collection"))?,
			backend,
			theme,
			origin: origin.trim_end_matches('/').to_string(),
		})
	}

	/// Reads the current window location.
	pub fn from_location() -> Result<Self, FetchError> {
		let location = web_sys::window()
			.map(|w| w.location())
			.ok_or(FetchError::MissingParameters("location"))?;
		let search = location.search().unwrap_or_default();
		let origin = location.origin().unwrap_or_default();
		Self::from_query(&search, &origin)
	}

	/// Backend label for the header.
	pub fn backend_label(&self) -> &str {
		self.backend.as_deref().unwrap_or("default")
	}
}

/// Form-style decoding: `+` is a space, then percent escapes.
fn decode(raw: &str) -> Cow<'_, str> {
	if raw.contains('+') {
		let spaced = raw.replace('+', " ");
		Cow::Owned(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
	} else {
		percent_decode_str(raw).decode_utf8_lossy()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_and_decodes() {
		let p = ViewParams::from_query(
			"?entity=Acme%20Corp&collection=c-42&backend=neo4j",
			"http://localhost:8080/",
		)
		.unwrap();
		assert_eq!(p.entity, "Acme Corp");
		assert_eq!(p.collection, "c-42");
		assert_eq!(p.backend.as_deref(), Some("neo4j"));
		assert_eq!(p.origin, "http://localhost:8080");
	}

	#[test]
	fn plus_is_space() {
		let p = ViewParams::from_query("entity=Acme+Corp&collection_id=x", "").unwrap();
		assert_eq!(p.entity, "Acme Corp");
		assert_eq!(p.backend_label(), "default");
	}

	#[test]
	fn missing_entity_or_collection_is_fatal() {
		let err = ViewParams::from_query("?collection=c", "").unwrap_err();
		assert!(matches!(err, FetchError::MissingParameters("entity")));

		let err = ViewParams::from_query("?entity=e&collection=", "").unwrap_err();
		assert!(matches!(err, FetchError::MissingParameters("collection")));
		assert!(!err.is_transport());
	}
}
