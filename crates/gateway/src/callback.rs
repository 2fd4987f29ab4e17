use super::GatewayError;
use reqwest::Url;
use std::collections::BTreeMap;

pub const TRANSACTION_PARAM: &str = "transid";

/// Query parameters of the provider's redirect back to the callback URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    params: BTreeMap<String, String>,
}

impl CallbackParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse the full URL the payer landed on.
    pub fn from_url(url: &str) -> Result<Self, GatewayError> {
        let url = Url::parse(url).map_err(|e| GatewayError::InvalidCallback(e.to_string()))?;
        Ok(Self::from_pairs(url.query_pairs().into_owned()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn transid(&self) -> Option<&str> {
        self.get(TRANSACTION_PARAM).filter(|id| !id.is_empty())
    }
}
