//! FHIR search client and response timing


use crate::{
    error::{AppError, Result},
    models::{Config, SearchResult},
    types::CacheDirective,
};
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde_json::Value;
use std::time::{Duration, Instant};

const FHIR_JSON: &str = "application/fhir+json";
const USER_AGENT: &str = concat!("fhir-search-latency/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Search client abstraction so batch runs can be driven by any backend
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Execute one search.
    ///
    /// `on_response` is called once with the round-trip time when the
    /// search completes successfully; failed searches never call it.
    async fn search(
        &self,
        request: &SearchRequest,
        on_response: &mut (dyn FnMut(Duration) + Send),
    ) -> Result<SearchResult>;
}

/// A single-parameter FHIR search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub resource_type: String,
    pub filter_field: String,
    pub filter_value: String,
    pub cache: CacheDirective,
}

impl SearchRequest {
    pub fn new(resource_type: &str, filter_field: &str, filter_value: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            filter_field: filter_field.to_string(),
            filter_value: filter_value.to_string(),
            cache: CacheDirective::default(),
        }
    }

    /// `Patient?family=<value>`
    pub fn patient_by_family(family: &str) -> Self {
        Self::new("Patient", "family", family)
    }

    pub fn with_cache(mut self, cache: CacheDirective) -> Self {
        self.cache = cache;
        self
    }
}

/// HTTP client for the FHIR REST search API
pub struct FhirClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl FhirClient {
    /// Create a new client against a FHIR base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        HttpUtils::validate_url(base_url)?;
        let base_url = Url::parse(base_url)?;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    /// Create a client from application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build `[base]/[type]?[field]=[value]`
    pub fn search_url(&self, request: &SearchRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::validation(format!("Base URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .push(&request.resource_type);
        url.set_query(None);
        url.set_fragment(None);
        url.query_pairs_mut()
            .append_pair(&request.filter_field, &request.filter_value);
        Ok(url)
    }
}

#[async_trait]
impl SearchClient for FhirClient {
    async fn search(
        &self,
        request: &SearchRequest,
        on_response: &mut (dyn FnMut(Duration) + Send),
    ) -> Result<SearchResult> {
        let url = self.search_url(request)?;

        let mut builder = self.http
            .get(url)
            .header(header::ACCEPT, FHIR_JSON);
        if let Some((name, value)) = request.cache.header() {
            builder = builder.header(name, value);
        }

        let start = Instant::now();
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        let elapsed = start.elapsed();

        if !status.is_success() {
            return Err(AppError::server(status.as_u16(), error_detail(&body)));
        }

        let document: Value = serde_json::from_slice(&body)?;
        let result = SearchResult::from_bundle(document)?;

        on_response(elapsed);
        Ok(result)
    }
}

/// Best-effort description of a failed response body.
///
/// Uses the first `OperationOutcome` issue diagnostics when present and
/// falls back to the start of the raw body.
fn error_detail(body: &[u8]) -> String {
    if let Ok(outcome) = serde_json::from_slice::<Value>(body) {
        if outcome.get("resourceType").and_then(Value::as_str) == Some("OperationOutcome") {
            let issue = outcome
                .get("issue")
                .and_then(Value::as_array)
                .and_then(|issues| issues.first());
            if let Some(issue) = issue {
                let text = issue
                    .get("diagnostics")
                    .and_then(Value::as_str)
                    .or_else(|| issue.pointer("/details/text").and_then(Value::as_str))
                    .or_else(|| issue.get("code").and_then(Value::as_str));
                if let Some(text) = text {
                    return text.to_string();
                }
            }
        }
    }

    String::from_utf8_lossy(body)
        .trim()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}

/// Utility functions for HTTP operations
pub struct HttpUtils;

impl HttpUtils {
    /// Validate URL format
    pub fn validate_url(url: &str) -> Result<()> {
        let parsed = Url::parse(url)
            .map_err(|e| AppError::validation(format!("Invalid URL format: {}", e)))?;

        match parsed.scheme() {
            "http" | "https" => {},
            scheme => return Err(AppError::validation(format!("Unsupported URL scheme: {}", scheme))),
        }

        if parsed.host().is_none() {
            return Err(AppError::validation("URL must have a host"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> FhirClient {
        FhirClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_search_request_creation() {
        let request = SearchRequest::patient_by_family("SMITH");
        assert_eq!(request.resource_type, "Patient");
        assert_eq!(request.filter_field, "family");
        assert_eq!(request.filter_value, "SMITH");
        assert_eq!(request.cache, CacheDirective::cached());

        let request = request.with_cache(CacheDirective::no_cache());
        assert!(request.cache.no_cache);
    }

    #[test]
    fn test_search_url_keeps_base_path() {
        let request = SearchRequest::patient_by_family("SMITH");

        let url = client("http://hapi.fhir.org/baseR4").search_url(&request).unwrap();
        assert_eq!(url.as_str(), "http://hapi.fhir.org/baseR4/Patient?family=SMITH");

        let url = client("http://hapi.fhir.org/baseR4/").search_url(&request).unwrap();
        assert_eq!(url.as_str(), "http://hapi.fhir.org/baseR4/Patient?family=SMITH");

        let url = client("https://example.org").search_url(&request).unwrap();
        assert_eq!(url.as_str(), "https://example.org/Patient?family=SMITH");
    }

    #[test]
    fn test_search_url_encodes_value() {
        let request = SearchRequest::patient_by_family("O'Brien Smith&Co");
        let url = client("http://hapi.fhir.org/baseR4").search_url(&request).unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("family".to_string(), "O'Brien Smith&Co".to_string())]);
    }

    #[test]
    fn test_client_rejects_invalid_base() {
        assert!(FhirClient::new("not-a-url", Duration::from_secs(5)).is_err());
        assert!(FhirClient::new("ftp://hapi.fhir.org/baseR4", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_client_from_config() {
        let config = Config::default();
        let client = FhirClient::from_config(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "http://hapi.fhir.org/baseR4");
        assert_eq!(client.timeout(), config.timeout());
    }

    #[test]
    fn test_error_detail_from_operation_outcome() {
        let body = br#"{
            "resourceType": "OperationOutcome",
            "issue": [{ "severity": "error", "code": "processing", "diagnostics": "HAPI-0302: Unknown search parameter" }]
        }"#;
        assert_eq!(error_detail(body), "HAPI-0302: Unknown search parameter");

        let body = br#"{"resourceType": "OperationOutcome", "issue": [{"severity": "error", "code": "throttled"}]}"#;
        assert_eq!(error_detail(body), "throttled");
    }

    #[test]
    fn test_error_detail_falls_back_to_body() {
        assert_eq!(error_detail(b"  Bad Gateway \n"), "Bad Gateway");

        let long = "x".repeat(500);
        assert_eq!(error_detail(long.as_bytes()).len(), MAX_ERROR_BODY_CHARS);
        assert_eq!(error_detail(b""), "");
    }

    #[test]
    fn test_http_utils_validate_url() {
        assert!(HttpUtils::validate_url("http://hapi.fhir.org/baseR4").is_ok());
        assert!(HttpUtils::validate_url("https://server.fire.ly").is_ok());

        assert!(HttpUtils::validate_url("ftp://example.com").is_err());
        assert!(HttpUtils::validate_url("not-a-url").is_err());
        assert!(HttpUtils::validate_url("").is_err());
    }
}
