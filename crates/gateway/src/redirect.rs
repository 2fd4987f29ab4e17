//! Redirection instructions handed to the caller's HTTP layer.
//!
//! A redirect is either a plain browser navigation (GET, no fields) or a form
//! the browser submits (POST with fields). The two stay distinct.

use super::HttpMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectionForm {
    /// Target URL
    pub action: String,
    /// How the browser should reach `action`
    pub method: HttpMethod,
    /// Form fields, always empty for GET
    pub inputs: BTreeMap<String, String>,
}

impl RedirectionForm {
    pub fn get(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            method: HttpMethod::Get,
            inputs: BTreeMap::new(),
        }
    }

    pub fn post(action: impl Into<String>, inputs: BTreeMap<String, String>) -> Self {
        Self {
            action: action.into(),
            method: HttpMethod::Post,
            inputs,
        }
    }

    pub fn is_get(&self) -> bool {
        self.method == HttpMethod::Get
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "action": self.action,
            "method": self.method,
            "inputs": self.inputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_redirect_has_no_inputs() {
        let form = RedirectionForm::get("https://paystar.ir/paying/abc");
        assert!(form.is_get());
        assert!(form.inputs.is_empty());
        assert_eq!(
            form.to_json(),
            serde_json::json!({
                "action": "https://paystar.ir/paying/abc",
                "method": "GET",
                "inputs": {},
            })
        );
    }

    #[test]
    fn post_redirect_keeps_fields() {
        let mut inputs = BTreeMap::new();
        inputs.insert("token".to_string(), "t".to_string());
        let form = RedirectionForm::post("https://psp.test/start", inputs);
        assert!(!form.is_get());
        assert_eq!(form.to_json()["method"], "POST");
        assert_eq!(form.to_json()["inputs"]["token"], "t");
    }
}
