use std::time::Duration;

use reqwest::Client;
use reqwest::Method;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde_json::Value;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://reqres.in";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const JSON: &str = "application/json";

#[derive(Debug, Error)]
pub enum ParseUrlError {
    #[error("base URL can't end with a /")]
    SetupUrlEndsWithSlash,
    #[error("path must begin with a leading /")]
    PathUrlMissingSlash,
    #[error("Failed to parse URL: {0}")]
    ParseIntoUrlFailed(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid url: {0}")]
    Url(#[from] ParseUrlError),

    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Joins a base URL and a path. The base must not end with `/` and the path
/// must start with one.
pub fn parse_url(base_url: &str, path_url: &str) -> Result<Url, ParseUrlError> {
    if base_url.ends_with('/') {
        return Err(ParseUrlError::SetupUrlEndsWithSlash);
    }

    if !path_url.starts_with('/') {
        return Err(ParseUrlError::PathUrlMissingSlash);
    }

    let url = Url::parse(&format!("{base_url}{path_url}"))?;

    Ok(url)
}

/// Defaults applied to every outgoing request: base URL, JSON content type and
/// accept headers, timeout and optional request/response logging.
#[derive(Debug, Clone)]
pub struct RequestProfile {
    base_url: String,
    headers: HeaderMap,
    verbose: bool,
    timeout: Duration,
    client: Client,
}

#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    base_url: String,
    extra_headers: HeaderMap,
    verbose: bool,
    timeout: Duration,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            extra_headers: HeaderMap::new(),
            verbose: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ProfileBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extra headers sent with every request. They can't override the JSON
    /// content type or accept headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.extra_headers = headers;
        self
    }

    pub fn build(self) -> Result<RequestProfile, ProfileError> {
        // validates the base url up front, so `apply` only fails on bad paths
        parse_url(&self.base_url, "/")?;

        let mut headers = self.extra_headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProfileError::Client)?;

        Ok(RequestProfile {
            base_url: self.base_url,
            headers,
            verbose: self.verbose,
            timeout: self.timeout,
            client,
        })
    }
}

impl RequestProfile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, path: &str) -> Result<Url, ParseUrlError> {
        parse_url(&self.base_url, path)
    }

    /// Sends one request with the profile's defaults and captures the
    /// response. No retries.
    pub async fn apply(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<CapturedResponse, ProfileError> {
        let url = self.url(path)?;

        self.log_request(&method, &url, body);

        let request = self
            .client
            .request(method, url)
            .headers(self.headers.clone());

        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = CapturedResponse::from_response(request.send().await?).await;
        self.log_response(&response);

        Ok(response)
    }

    fn log_request(&self, method: &Method, url: &Url, body: Option<&Value>) {
        let body = body.map(Value::to_string).unwrap_or_default();
        let headers = format_headers(&self.headers);

        if self.verbose {
            tracing::info!(%method, %url, %headers, %body, "request");
        } else {
            tracing::debug!(%method, %url, %headers, %body, "request");
        }
    }

    fn log_response(&self, response: &CapturedResponse) {
        let status = response.status;
        let headers = format_headers(&response.headers);
        let body = &response.body_text;

        if self.verbose {
            tracing::info!(%status, %headers, %body, "response");
        } else {
            tracing::debug!(%status, %headers, %body, "response");
        }
    }
}

fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v.to_str().unwrap_or("<invalid utf8>")))
        .collect::<Vec<String>>()
        .join(", ")
}

#[derive(Debug)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body_text: String,
    pub body_json: Option<Value>,
}

impl CapturedResponse {
    pub async fn from_response(resp: Response) -> Self {
        let status = resp.status();
        let headers = resp.headers().clone();

        // Consume the body exactly once
        let body_text = match resp.text().await {
            Ok(t) => t,
            Err(err) => format!("Failed to read body: {}", err),
        };

        let body_json = serde_json::from_str::<Value>(&body_text).ok();

        Self {
            status,
            headers,
            body_text,
            body_json,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use std::sync::Arc;
    use std::sync::Mutex;

    use axum::Json;
    use axum::Router;
    use axum::routing::get;
    use reqwest::header::HeaderName;
    use serde_json::json;
    use tracing::Level;
    use tracing::instrument::WithSubscriber;

    use super::*;

    #[test]
    fn joins_base_and_path() {
        let url = parse_url("https://reqres.in", "/api/users").unwrap();
        assert_eq!(url.as_str(), "https://reqres.in/api/users");
    }

    #[test]
    fn rejects_slash_mismatches() {
        assert!(matches!(
            parse_url("https://reqres.in/", "/api/users"),
            Err(ParseUrlError::SetupUrlEndsWithSlash)
        ));
        assert!(matches!(
            parse_url("https://reqres.in", "api/users"),
            Err(ParseUrlError::PathUrlMissingSlash)
        ));
        assert!(matches!(
            parse_url("reqres", "/api/users"),
            Err(ParseUrlError::ParseIntoUrlFailed(_))
        ));
    }

    #[test]
    fn profile_defaults() {
        let profile = RequestProfile::builder().build().unwrap();

        assert_eq!(profile.base_url(), DEFAULT_BASE_URL);
        assert_eq!(profile.timeout(), DEFAULT_TIMEOUT);
        assert!(!profile.is_verbose());
        assert_eq!(profile.headers().get(CONTENT_TYPE).unwrap(), JSON);
        assert_eq!(profile.headers().get(ACCEPT).unwrap(), JSON);
    }

    #[test]
    fn extra_headers_cannot_replace_json_headers() {
        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        extra.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_static("reqres-free-v1"),
        );

        let profile = RequestProfile::builder().headers(extra).build().unwrap();

        assert_eq!(profile.headers().get(CONTENT_TYPE).unwrap(), JSON);
        assert_eq!(profile.headers().get("x-api-key").unwrap(), "reqres-free-v1");
    }

    #[test]
    fn build_rejects_trailing_slash() {
        let result = RequestProfile::builder()
            .base_url("https://reqres.in/")
            .build();

        assert!(matches!(
            result,
            Err(ProfileError::Url(ParseUrlError::SetupUrlEndsWithSlash))
        ));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    async fn serve_ping() -> String {
        let app = Router::new().route("/api/ping", get(|| async { Json(json!({ "ok": true })) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }

    /// Sends one request with the subscriber filtered at INFO and returns what
    /// it wrote.
    async fn logged_at_info(verbose: bool) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(Level::INFO)
            .with_ansi(false)
            .finish();

        let profile = RequestProfile::builder()
            .base_url(serve_ping().await)
            .verbose(verbose)
            .build()
            .unwrap();

        let response = profile
            .apply(Method::POST, "/api/ping", Some(&json!({ "name": "jack" })))
            .with_subscriber(subscriber)
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);

        captured.contents()
    }

    #[tokio::test]
    async fn verbose_logs_request_and_response_at_info() {
        let output = logged_at_info(true).await;

        assert!(output.contains("INFO"), "{output}");
        assert!(output.contains("request"), "{output}");
        assert!(output.contains("response"), "{output}");
        assert!(output.contains("/api/ping"), "{output}");
        assert!(output.contains("jack"), "{output}");
        assert!(output.contains("200"), "{output}");
    }

    #[tokio::test]
    async fn quiet_profile_stays_below_info() {
        let output = logged_at_info(false).await;

        assert!(!output.contains("request"), "{output}");
        assert!(!output.contains("response"), "{output}");
    }

    #[tokio::test]
    async fn apply_rejects_relative_path_before_sending() {
        let profile = RequestProfile::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();

        let result = profile.apply(Method::GET, "api/unknown", None).await;
        assert!(matches!(
            result,
            Err(ProfileError::Url(ParseUrlError::PathUrlMissingSlash))
        ));
    }
}
