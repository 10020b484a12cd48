//! Field extraction from the query string and request body

use std::collections::HashMap;

use axum::body::Body;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::AssessError;

/// Body limit for assessment requests (1 MiB)
const BODY_LIMIT_BYTES: usize = 1 << 20;

/// Request fields merged from the query string and the body
///
/// A non-blank query value wins over the body value of the same name.
#[derive(Debug, Default)]
pub struct Params {
    query: HashMap<String, String>,
    body: Map<String, Value>,
}

impl Params {
    /// Look up a field, treating absent, `null` and blank values as missing
    ///
    /// Non-string JSON values are returned in their JSON text form, so a
    /// numeric `currentLevel` reads as `"200"`.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.query.get(key).filter(|v| !v.trim().is_empty()) {
            return Some(value.clone());
        }

        match self.body.get(key)? {
            Value::Null => None,
            Value::String(value) if value.trim().is_empty() => None,
            Value::String(value) => Some(value.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Extractor collecting [`Params`] from any request method
pub struct ExtractParams(pub Params);

impl<S> axum::extract::FromRequest<S> for ExtractParams
where
    S: Send + Sync,
{
    type Rejection = AssessError;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        let query = parts
            .uri
            .query()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let bytes = axum::body::to_bytes(body, BODY_LIMIT_BYTES).await.map_err(|err| {
            if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
                AssessError::PayloadTooLarge {
                    limit: BODY_LIMIT_BYTES,
                }
            } else {
                AssessError::InvalidBody(format!("Failed to read request body: {err}"))
            }
        })?;

        let body = if bytes.is_empty() {
            Map::new()
        } else {
            match BodyFormat::from_headers(&parts.headers) {
                Some(BodyFormat::Json) => parse_json_object(&bytes)?,
                Some(BodyFormat::Form) => form_urlencoded::parse(&bytes)
                    .into_owned()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect(),
                None => return Err(AssessError::UnsupportedMediaType),
            }
        };

        Ok(Self(Params { query, body }))
    }
}

enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    fn from_headers(headers: &http::HeaderMap) -> Option<Self> {
        let content_type = headers.get(http::header::CONTENT_TYPE)?.to_str().ok()?;
        let mime = content_type.split(';').next().unwrap_or_default().trim();

        if mime.eq_ignore_ascii_case("application/json") {
            Some(Self::Json)
        } else if mime.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(Self::Form)
        } else {
            None
        }
    }
}

fn parse_json_object(bytes: &[u8]) -> Result<Map<String, Value>, AssessError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AssessError::InvalidBody("Request body must be a JSON object".to_owned())),
        Err(e) => Err(AssessError::InvalidBody(format!("Failed to parse request body: {e}"))),
    }
}
