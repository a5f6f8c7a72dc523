use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies};
use tracing::debug;

const FLASH_COOKIE_NAME: &str = "_flash";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FlashLevel {
    Success,
    Info,
    Error,
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct FlashMessage {
    pub(crate) level: FlashLevel,
    pub(crate) message: String,
}

fn read(cookies: &Cookies) -> Vec<FlashMessage> {
    cookies
        .get(FLASH_COOKIE_NAME)
        .and_then(|cookie| match serde_json::from_str(cookie.value()) {
            Ok(messages) => Some(messages),
            Err(err) => {
                debug!(error = %err, "ignoring malformed flash cookie");
                None
            }
        })
        .unwrap_or_default()
}

pub(crate) fn push_flash(cookies: &Cookies, level: FlashLevel, message: impl Into<String>) {
    let mut messages = read(cookies);
    messages.push(FlashMessage {
        level,
        message: message.into(),
    });

    match serde_json::to_string(&messages) {
        Ok(value) => {
            let mut cookie = Cookie::new(FLASH_COOKIE_NAME, value);
            cookie.set_path("/");
            cookie.set_http_only(true);
            cookies.add(cookie);
        }
        Err(err) => debug!(error = %err, "dropping flash message"),
    }
}

/// Returns pending notices and clears them.
pub(crate) fn take_flash(cookies: &Cookies) -> Vec<FlashMessage> {
    let messages = read(cookies);
    if cookies.get(FLASH_COOKIE_NAME).is_some() {
        let mut cookie = Cookie::new(FLASH_COOKIE_NAME, "");
        cookie.set_path("/");
        cookies.remove(cookie);
    }
    messages
}
