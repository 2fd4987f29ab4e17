use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider answered the purchase with a numeric status code.
    #[error("{0}")]
    PurchaseFailed(String),
    /// The provider did not confirm the payment.
    #[error("{0}")]
    InvalidPayment(String),
    #[error("invoice has no transaction id")]
    MissingTransactionId,
    #[error("invalid invoice: {}", .0.join("; "))]
    InvalidInvoice(Vec<String>),
    #[error("invalid callback: {0}")]
    InvalidCallback(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl GatewayError {
    /// Provider-level rejections, as opposed to local or transport problems.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GatewayError::PurchaseFailed(_) | GatewayError::InvalidPayment(_)
        )
    }
}
