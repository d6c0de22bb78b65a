//! Downstream HTTP reachability probe.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::health::probe::{Probe, ProbeContext};
use crate::health::state::ProbeResult;

/// Issues a GET against a fixed URL and checks the response status.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: Url,
    uri: Uri,
    expected_status: Option<StatusCode>,
    client: Client<HttpConnector, Body>,
}

impl HttpProbe {
    /// Build a probe for a plain `http://` URL.
    pub fn new(url: Url, expected_status: Option<StatusCode>) -> Result<Self, axum::http::uri::InvalidUri> {
        let uri: Uri = url.as_str().parse()?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            url,
            uri,
            expected_status,
            client,
        })
    }

    fn accepts(&self, status: StatusCode) -> bool {
        match self.expected_status {
            Some(expected) => status == expected,
            None => status.is_success(),
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self, ctx: &ProbeContext) -> ProbeResult {
        let request = match Request::builder()
            .method("GET")
            .uri(self.uri.clone())
            .header("user-agent", "healthgate-probe")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                return ProbeResult::failure(ctx.failure_status, "invalid request", e)
                    .with_data("url", self.url.as_str());
            }
        };

        match self.client.request(request).await {
            Ok(response) if self.accepts(response.status()) => {
                ProbeResult::healthy(format!("{} is reachable", self.url))
                    .with_data("url", self.url.as_str())
                    .with_data("status", response.status().as_u16().to_string())
            }
            Ok(response) => {
                let status = response.status();
                tracing::warn!(probe = %ctx.name, url = %self.url, status = %status, "Probe got unexpected status");
                ProbeResult::failure(
                    ctx.failure_status,
                    "unexpected status",
                    format!("{} returned {}", self.url, status),
                )
                .with_data("url", self.url.as_str())
                .with_data("status", status.as_u16().to_string())
            }
            Err(e) => {
                tracing::warn!(probe = %ctx.name, url = %self.url, error = %e, "Probe connection error");
                ProbeResult::failure(ctx.failure_status, "unreachable", e)
                    .with_data("url", self.url.as_str())
            }
        }
    }
}
