//! Provider status codes and their messages.
//!
//! Keys and messages are kept exactly as the provider table ships them. Most of
//! the text arrived with a broken encoding; it stays opaque here until corrected
//! strings are sourced from the provider documentation.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const UNKNOWN_ERROR: &str = "???????? ???????????????? ???? ???????? ??????.";

pub const STATUS_MESSAGES: &[(&str, &str)] = &[
    ("???1", "???????? ???????????? ???????????????? ???????? ????????."),
    ("???2", "???? ?????? ??????????(???? ??????????) ???????????????? ???????? ????????."),
    ("???3", "???????? ???????????? (callback) ???????????????? ???????? ????????."),
    ("???4", "???????? ???????????? ???????? ???????? ????????."),
    ("???5", "???????? ???????????? ???????? ???????????? ???? ?????? ????????."),
    ("???6", "???? ?????? ?????????? (??????????) ???????????? ??????."),
    ("???7", "???????? ???????? ???? ???????? ?????????? ???????????? ??????????"),
    ("???8", "???? ???????????? (transid) ???????????????? ???????? ????????."),
    ("???9", "???????????? ???????? ?????? ???????? ??????????."),
    ("???10", "?????????? ?????????? ???? ?????????? ???????????? ???????????? ??????????."),
    ("???11", "???????? ???? ???????? ???????????? ???????????? ??????????."),
    ("-12", "???????? ?????????????? ???????????? ??????."),
    ("-13", "?????????? ?????????????? ??????."),
    ("-14", "???????? ?????????? ?????????? ???????? ??????."),
];

static TRANSLATIONS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| STATUS_MESSAGES.iter().copied().collect());

/// Look up the message for a raw provider status token.
pub fn translate_status(status: &str) -> &'static str {
    TRANSLATIONS.get(status).copied().unwrap_or(UNKNOWN_ERROR)
}
