//! HTTP transport for [`ApiGateway`] backed by `reqwest`.
//!
//! # Invariants
//! - The identity travels as a plain `x-user` header. It carries no signature
//!   or expiry, so anyone who can reach the service can act as any user whose
//!   name they know. Do not treat this transport as production-grade auth.
//! - Bodies and headers are never logged; only method, path, status and timing.

use super::gateway::{interpret_response, ApiGateway, ApiRequest, Method};
use super::{ApiError, ApiResult};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Instant;

/// Header carrying the signed-in identifier.
pub const IDENTITY_HEADER: &str = "x-user";

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl AsRef<str>) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Uses a preconfigured client (proxies, custom TLS roots).
    pub fn with_client(client: reqwest::Client, base_url: impl AsRef<str>) -> Self {
        Self {
            client,
            base_url: base_url.as_ref().trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait(?Send)]
impl ApiGateway for HttpGateway {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let started_at = Instant::now();
        let url = format!("{}{}", self.base_url, request.path);
        debug!(
            "event=api_request module=api status=start request_id={} method={} path={}",
            request.request_id, request.method, request.path
        );

        let mut builder = self
            .client
            .request(to_reqwest(request.method), url.as_str())
            .header(CONTENT_TYPE, "application/json");
        if let Some(identity) = request.identity.as_deref() {
            builder = builder.header(IDENTITY_HEADER, identity);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| {
            warn!(
                "event=api_request module=api status=error request_id={} error_code=transport duration_ms={} error={}",
                request.request_id,
                started_at.elapsed().as_millis(),
                err
            );
            ApiError::Transport(err.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let result = interpret_response(status, &text);

        match &result {
            Ok(_) => info!(
                "event=api_request module=api status=ok request_id={} method={} path={} http_status={} duration_ms={}",
                request.request_id,
                request.method,
                request.path,
                status,
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=api_request module=api status=error request_id={} method={} path={} http_status={} duration_ms={} error={}",
                request.request_id,
                request.method,
                request.path,
                status,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}
