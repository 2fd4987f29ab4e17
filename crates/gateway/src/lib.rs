use async_trait::async_trait;
use paystar_core::{Invoice, Receipt};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod callback;
pub mod error;
pub mod http;
pub mod mock;
pub mod paystar;
pub mod redirect;

pub use callback::CallbackParams;
pub use error::{GatewayError, TransportError};
pub use redirect::RedirectionForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// One outbound call. `form` is sent url-encoded for POST and ignored for GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            form,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw provider reply. A 4xx/5xx status is still a response, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// A payment provider driving the purchase, pay and verify phases.
#[async_trait]
pub trait Driver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn purchase(&self, invoice: &mut Invoice) -> Result<String, GatewayError>;

    fn pay(&self, invoice: &Invoice) -> Result<RedirectionForm, GatewayError>;

    async fn verify(
        &self,
        invoice: &Invoice,
        callback: Option<&CallbackParams>,
    ) -> Result<Receipt, GatewayError>;
}
