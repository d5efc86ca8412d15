//! Network access for cache misses
//!
//! [`Fetcher`] is the seam between request resolution and the network.
//! [`HttpFetcher`] performs real HTTP requests and classifies responses the
//! way a browser does for no-cors requests, by the URL the response finally
//! came from after redirects:
//! - same origin as the scope: `basic`
//! - cross origin with a matching `Access-Control-Allow-Origin`: `cors`
//! - any other cross-origin response: `opaque` (status 0, nothing readable)

use crate::error::{CacheError, CacheResult};
use crate::http::{Headers, RequestDescriptor, Response, ResponseType, Scope};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::{Agent, ResponseExt};
use url::Url;

/// Abstract network interface
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request. Transport failures (offline, DNS, timeout)
    /// return `CacheError::Network`; HTTP error statuses are responses.
    async fn fetch(&self, request: &RequestDescriptor) -> CacheResult<Response>;
}

/// Status, headers and body as read off the wire, before classification
struct RawResponse {
    /// Final URL after redirects
    url: Url,
    status: u16,
    headers: Headers,
    body: Vec<u8>,
}

/// Blocking ureq client driven from the tokio blocking pool
pub struct HttpFetcher {
    agent: Agent,
    scope: Scope,
}

impl HttpFetcher {
    pub fn new(scope: Scope, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self { agent, scope }
    }

    fn classify(&self, raw: RawResponse) -> Response {
        if self.scope.is_same_origin(&raw.url) {
            return Response::new(raw.status, ResponseType::Basic, raw.body)
                .with_headers(raw.headers)
                .with_url(raw.url.as_str());
        }

        let origin = self.scope.base().origin().ascii_serialization();
        let allowed = raw
            .headers
            .get("access-control-allow-origin")
            .is_some_and(|value| value == "*" || value == origin);

        if allowed {
            Response::new(raw.status, ResponseType::Cors, raw.body)
                .with_headers(raw.headers)
                .with_url(raw.url.as_str())
        } else {
            Response::opaque()
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> CacheResult<Response> {
        let agent = self.agent.clone();
        let owned = request.clone();

        let raw = tokio::task::spawn_blocking(move || perform(&agent, &owned))
            .await
            .map_err(|e| CacheError::Internal(format!("fetch task failed: {}", e)))??;

        debug!("Network {} -> {} from {}", request, raw.status, raw.url);
        Ok(self.classify(raw))
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &RequestDescriptor,
) -> ureq::RequestBuilder<B> {
    for (name, value) in request.headers().iter() {
        builder = builder.header(name, value);
    }
    builder
}

fn perform(agent: &Agent, request: &RequestDescriptor) -> CacheResult<RawResponse> {
    let url = request.url().as_str();
    let body = request.body().unwrap_or_default();

    let result = match request.method() {
        "GET" => with_headers(agent.get(url), request).call(),
        "HEAD" => with_headers(agent.head(url), request).call(),
        "DELETE" => with_headers(agent.delete(url), request).call(),
        "OPTIONS" => with_headers(agent.options(url), request).call(),
        "POST" => with_headers(agent.post(url), request).send(body),
        "PUT" => with_headers(agent.put(url), request).send(body),
        "PATCH" => with_headers(agent.patch(url), request).send(body),
        other => {
            return Err(CacheError::network(
                url,
                format!("unsupported method {}", other),
            ))
        }
    };

    let mut response = result.map_err(|e| CacheError::network(url, e))?;

    let final_url = Url::parse(&response.get_uri().to_string())
        .unwrap_or_else(|_| request.url().clone());
    let status = response.status().as_u16();
    let mut headers = Headers::new();
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            headers.append(name.as_str(), value);
        }
    }

    // Lift ureq's 10 MiB default read cap
    let body = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_vec()
        .map_err(|e| CacheError::network(url, e))?;

    Ok(RawResponse {
        url: final_url,
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(
            Scope::parse("http://localhost:8080/").unwrap(),
            Duration::from_secs(1),
        )
    }

    fn fetcher_for(server: &MockServer) -> HttpFetcher {
        HttpFetcher::new(
            Scope::parse(&format!("{}/", server.uri())).unwrap(),
            Duration::from_secs(5),
        )
    }

    fn raw(url: &str, status: u16, headers: &[(&str, &str)]) -> RawResponse {
        RawResponse {
            url: Url::parse(url).unwrap(),
            status,
            headers: headers.iter().copied().collect(),
            body: b"data".to_vec(),
        }
    }

    #[test]
    fn same_origin_is_basic() {
        let response = fetcher().classify(raw("http://localhost:8080/app.js", 200, &[]));
        assert_eq!(response.kind(), ResponseType::Basic);
        assert_eq!(response.status(), 200);
        assert_eq!(response.url(), Some("http://localhost:8080/app.js"));
    }

    #[test]
    fn cross_origin_without_permission_is_opaque() {
        let mut response = fetcher().classify(raw("https://cross-origin.example/img.png", 200, &[]));
        assert_eq!(response.kind(), ResponseType::Opaque);
        assert_eq!(response.status(), 0);
        assert!(response.bytes().unwrap().is_empty());
    }

    #[test]
    fn cross_origin_with_permission_is_cors() {
        let response = fetcher().classify(raw(
            "https://cdn.example/lib.js",
            200,
            &[("Access-Control-Allow-Origin", "http://localhost:8080")],
        ));
        assert_eq!(response.kind(), ResponseType::Cors);
        assert!(!response.is_cacheable());
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let fetcher = HttpFetcher::new(
            Scope::parse("http://127.0.0.1:9/").unwrap(),
            Duration::from_secs(1),
        );
        let request = fetcher.scope.request("./").unwrap();
        let err = fetcher.fetch(&request).await.unwrap_err();
        assert!(matches!(err, CacheError::Network { .. }));
    }

    #[tokio::test]
    async fn redirect_to_other_origin_is_opaque() {
        let server = MockServer::start().await;
        let other = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/redir"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/foreign", other.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/foreign"))
            .respond_with(ResponseTemplate::new(200).set_body_string("foreign"))
            .mount(&other)
            .await;

        let fetcher = fetcher_for(&server);
        let request = fetcher.scope.request("./redir").unwrap();
        let mut response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.kind(), ResponseType::Opaque);
        assert!(!response.is_cacheable());
        assert!(response.bytes().unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_origin_redirect_keeps_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old.html"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new.html"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let request = fetcher.scope.request("./old.html").unwrap();
        let mut response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.kind(), ResponseType::Basic);
        assert_eq!(response.url(), Some(format!("{}/new.html", server.uri()).as_str()));
        assert_eq!(response.text().unwrap(), "moved");
    }

    #[tokio::test]
    async fn body_over_ten_mebibytes_is_read_whole() {
        let server = MockServer::start().await;
        let payload = vec![7u8; 11 * 1024 * 1024];
        Mock::given(method("GET"))
            .and(path("/big.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let request = fetcher.scope.request("./big.bin").unwrap();
        let mut response = fetcher.fetch(&request).await.unwrap();

        assert!(response.is_cacheable());
        assert_eq!(response.bytes().unwrap().len(), payload.len());
    }
}
