use std::sync::Arc;

use assessor_config::{AnyOrArray, CorsConfig};
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
    ORIGIN, VARY,
};
use http::{HeaderMap, HeaderValue, Method, StatusCode};

/// Pre-rendered CORS response headers
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    origins: Origins,
    methods: HeaderValue,
    headers: HeaderValue,
    max_age: Option<HeaderValue>,
}

#[derive(Debug, Clone)]
enum Origins {
    Any,
    List(Vec<HeaderValue>),
}

impl CorsHeaders {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configured value is not a valid header value
    pub fn from_config(config: &CorsConfig) -> anyhow::Result<Self> {
        let origins = match &config.origins {
            AnyOrArray::Any => Origins::Any,
            AnyOrArray::List(origins) => Origins::List(
                origins
                    .iter()
                    .map(|o| HeaderValue::from_str(o).map_err(|e| anyhow::anyhow!("invalid CORS origin '{o}': {e}")))
                    .collect::<anyhow::Result<_>>()?,
            ),
        };

        let render = |name: &str, value: &AnyOrArray| {
            HeaderValue::from_str(&value.to_header_value())
                .map_err(|e| anyhow::anyhow!("invalid CORS {name} list: {e}"))
        };

        Ok(Self {
            origins,
            methods: render("methods", &config.methods)?,
            headers: render("headers", &config.headers)?,
            max_age: config.max_age_duration().map(|age| HeaderValue::from(age.as_secs())),
        })
    }

    /// Value for `Access-Control-Allow-Origin`, if the origin is allowed
    fn allow_origin(&self, request_origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        match &self.origins {
            Origins::Any => Some(HeaderValue::from_static("*")),
            Origins::List(allowed) => request_origin.filter(|origin| allowed.contains(*origin)).cloned(),
        }
    }

    fn apply(&self, headers: &mut HeaderMap, origin: Option<HeaderValue>, preflight: bool) {
        if let Some(origin) = origin {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        if matches!(self.origins, Origins::List(_)) {
            headers.append(VARY, HeaderValue::from_static("origin"));
        }
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.headers.clone());
        if preflight && let Some(ref max_age) = self.max_age {
            headers.insert(ACCESS_CONTROL_MAX_AGE, max_age.clone());
        }
    }
}

/// CORS middleware
///
/// Adds the configured headers to every response. `OPTIONS` requests on any
/// path are answered here with 204 and an empty body.
pub async fn cors_middleware(cors: Arc<CorsHeaders>, request: Request, next: Next) -> Response {
    let origin = cors.allow_origin(request.headers().get(ORIGIN));

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        cors.apply(response.headers_mut(), origin, true);
        return response;
    }

    let mut response = next.run(request).await;
    cors.apply(response.headers_mut(), origin, false);
    response
}
