pub mod engine;
pub mod response;

mod error;

pub use engine::EngineClient;
pub use error::{Error, Result};
pub use response::{DeleteByQueryResponse, RawHit, RawResponse, Total};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

/// Headers sent with every engine call. The key, when configured, uses the `ApiKey` scheme.
pub fn auth_headers(api_key: Option<&str>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	if let Some(key) = api_key.filter(|key| !key.trim().is_empty()) {
		headers.insert(AUTHORIZATION, format!("ApiKey {key}").parse()?);
	}

	Ok(headers)
}
