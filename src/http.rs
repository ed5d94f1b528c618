//! Process-wide HTTP client shared by every REST provider.

use crate::error::Result;
use std::sync::OnceLock;
use std::time::Duration;

/// Default timeout for upstream API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

static HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get the shared HTTP client, building it on first use.
///
/// `reqwest::Client` is an `Arc` internally, so the returned clone shares
/// the same connection pool.
pub fn shared_client() -> Result<reqwest::Client> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .user_agent(concat!("c3/", env!("CARGO_PKG_VERSION")))
        .build()?;

    // A concurrent caller may have won the race; either client is fine.
    Ok(HTTP_CLIENT.get_or_init(|| client).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_client_is_initialized_once() {
        shared_client().unwrap();
        assert!(HTTP_CLIENT.get().is_some());
        shared_client().unwrap();
    }
}
