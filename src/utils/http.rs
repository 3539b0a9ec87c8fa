use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

use crate::config::CONFIG;

// Both the gallery site and AniList are fetched through a single client
// carrying a browser-like User-Agent and a fixed per-request timeout.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(CONFIG.http_user_agent.clone())
        .timeout(Duration::from_secs(CONFIG.http_timeout_seconds))
        .build()
        .expect("Failed to build HTTP client")
});

pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}
