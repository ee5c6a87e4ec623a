use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use tracing::debug;

/// HTTP client shared by the site adapters. Picks a random user agent per request.
pub struct HttpClient {
    client: Client,
    user_agents: Vec<String>,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agents: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            user_agents,
        })
    }

    fn user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        Some(self.user_agents[fastrand::usize(..self.user_agents.len())].as_str())
    }

    /// GET `url` and return the body; non-success statuses are errors.
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(ua) = self.user_agent() {
            request = request.header(USER_AGENT, ua);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Failed to fetch {}: {}", url, status);
        }

        let html = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        debug!("Downloaded {} bytes from {}", html.len(), url);
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_rotation() {
        let none = HttpClient::new(Duration::from_secs(1), vec![]).unwrap();
        assert!(none.user_agent().is_none());

        let agents = vec!["ua-1".to_string(), "ua-2".to_string()];
        let client = HttpClient::new(Duration::from_secs(1), agents.clone()).unwrap();
        for _ in 0..20 {
            let ua = client.user_agent().unwrap();
            assert!(agents.iter().any(|a| a == ua));
        }
    }
}
