use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{sleep, Duration};

enum Scripted {
    Response(HttpResponse),
    Error(String),
}

#[derive(Default)]
struct MockState {
    script: VecDeque<Scripted>,
    requests: Vec<HttpRequest>,
}

/// In-process stand-in for the provider.
///
/// Scripted replies are served first, in order. With an empty script it
/// behaves like a cooperative provider: purchases get a fresh random
/// transaction id and verifications answer `1`.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
    latency: Duration,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Self::default()
        })
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.lock().script.push_back(Scripted::Response(HttpResponse {
            status,
            body: body.into(),
        }));
    }

    pub fn push_body(&self, body: impl Into<String>) {
        self.push_response(200, body);
    }

    pub fn push_error(&self, reason: impl Into<String>) {
        self.lock().script.push_back(Scripted::Error(reason.into()));
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.lock().requests.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn simulate(request: &HttpRequest) -> HttpResponse {
        let body = match request.method {
            HttpMethod::Get => String::new(),
            HttpMethod::Post if request.field("transid").is_some() => "1".to_string(),
            HttpMethod::Post => rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(16)
                .map(char::from)
                .collect(),
        };
        HttpResponse { status: 200, body }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let next = {
            let mut state = self.lock();
            state.requests.push(request.clone());
            state.script.pop_front()
        };

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        match next {
            Some(Scripted::Response(resp)) => Ok(resp),
            Some(Scripted::Error(reason)) => Err(TransportError::Unavailable(reason)),
            None => Ok(Self::simulate(&request)),
        }
    }
}
