use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Form-posting transport backed by reqwest.
///
/// HTTP error statuses are returned as ordinary responses; the provider puts
/// its status codes in the body, so only network-level failures are errors.
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Arc<Self>, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Arc::new(Self { http_client }))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let builder = match request.method {
            HttpMethod::Get => self.http_client.get(&request.url),
            HttpMethod::Post => self.http_client.post(&request.url).form(&request.form),
        };

        let resp = builder.send().await?;
        let status = resp.status();
        // Status codes are matched byte for byte, so the body is read raw
        // rather than re-decoded through whatever charset the reply declares.
        let bytes = resp.bytes().await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            "provider responded"
        );

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}
