//! API server configuration.

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default PostgreSQL connection URL.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/cern";

/// Resolved server settings, built by the server binary from its flags and
/// environment.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:8000").
    pub bind_addr: String,
    /// PostgreSQL connection URL. Unused with the in-memory store.
    pub database_url: String,
    /// Base URL of an inference service. `None` serves the canned reply.
    pub inference_url: Option<String>,
}

impl ApiConfig {
    pub fn new(host: &str, port: u16, database_url: String, inference_url: Option<String>) -> Self {
        Self {
            bind_addr: format!("{host}:{port}"),
            database_url,
            inference_url: inference_url.filter(|u| !u.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_host_and_port() {
        let config = ApiConfig::new("127.0.0.1", DEFAULT_PORT, DEFAULT_DATABASE_URL.into(), None);
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.database_url, "postgres://localhost:5432/cern");
    }

    #[test]
    fn blank_inference_url_means_canned_replies() {
        let config = ApiConfig::new("0.0.0.0", 0, String::new(), Some("  ".into()));
        assert!(config.inference_url.is_none());

        let config = ApiConfig::new("0.0.0.0", 0, String::new(), Some("http://infer:8001".into()));
        assert_eq!(config.inference_url.as_deref(), Some("http://infer:8001"));
    }
}
