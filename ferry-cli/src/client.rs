//! HTTP client for a mounted migration router

use ferry_core::MigrationMeta;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Header carrying the shared secret
pub const SECRET_HEADER: &str = "x-secret-key";

/// Client-side failures
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL could not be used
    #[error("Invalid server URL \"{0}\"")]
    InvalidUrl(String),

    /// Connection or protocol failure
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// Target URL
        url: String,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx status with the server's message
    #[error("{message} ({status})")]
    Server {
        /// Response status
        status: StatusCode,
        /// `message` from the body, or the raw body
        message: String,
    },

    /// 2xx body without the expected list
    #[error("Unexpected response body: {0}")]
    Body(String),
}

/// Read-only listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Executed then pending
    All,
    /// Not yet applied
    Pending,
    /// Already applied
    Executed,
}

impl Listing {
    /// Path segment and response key; both are the same word
    pub fn key(self) -> &'static str {
        match self {
            Listing::All => "all",
            Listing::Pending => "pending",
            Listing::Executed => "executed",
        }
    }
}

/// How far an `up` or `down` goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Server default: everything pending, or the last executed
    Default,
    /// Up to and including a named migration
    To(String),
    /// A number of migrations
    Step(usize),
}

/// Migration direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Apply
    Up,
    /// Revert
    Down,
}

impl Direction {
    fn segment(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// Client bound to one server and secret
#[derive(Debug, Clone)]
pub struct FerryClient {
    http: reqwest::Client,
    base: Url,
    secret: String,
}

impl FerryClient {
    /// `base_url` includes the host application's base path, if any
    pub fn new(base_url: &str, secret: impl Into<String>) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            secret: secret.into(),
        })
    }

    /// URL for `migrations/<segments...>`
    pub fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push("migrations")
            .extend(segments);
        Ok(url)
    }

    /// `GET migrations/<listing>`
    pub async fn list(&self, listing: Listing) -> Result<Vec<MigrationMeta>, ClientError> {
        let url = self.url(&[listing.key()])?;
        self.send(Method::GET, url, listing.key()).await
    }

    /// `POST migrations/<up|down>[/<id>|/step/<n>]`
    pub async fn run(
        &self,
        direction: Direction,
        target: &Target,
    ) -> Result<Vec<MigrationMeta>, ClientError> {
        let step;
        let segments: Vec<&str> = match target {
            Target::Default => vec![direction.segment()],
            Target::To(id) => vec![direction.segment(), id.as_str()],
            Target::Step(count) => {
                step = count.to_string();
                vec![direction.segment(), "step", step.as_str()]
            }
        };
        let url = self.url(&segments)?;
        self.send(Method::POST, url, "migrations").await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        key: &str,
    ) -> Result<Vec<MigrationMeta>, ClientError> {
        debug!("{} {}", method, url);
        let transport = |source: reqwest::Error| ClientError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .request(method.clone(), url.clone())
            .header(SECRET_HEADER, &self.secret)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        debug!("{} {} -> {}", method, url, status);

        if !status.is_success() {
            return Err(ClientError::Server {
                status,
                message: server_message(&text),
            });
        }
        parse_list(&text, key)
    }
}

/// The `message` field of an error body, falling back to the raw text
fn server_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| body.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| text.trim().to_string())
}

fn parse_list(text: &str, key: &str) -> Result<Vec<MigrationMeta>, ClientError> {
    let mut body: Value =
        serde_json::from_str(text).map_err(|e| ClientError::Body(e.to_string()))?;
    let list = body
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| ClientError::Body(format!("missing \"{}\"", key)))?;
    serde_json::from_value(list).map_err(|e| ClientError::Body(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> FerryClient {
        FerryClient::new(base, "secret").unwrap()
    }

    #[test]
    fn test_urls() {
        let c = client("http://localhost:8080");
        assert_eq!(
            c.url(&["pending"]).unwrap().as_str(),
            "http://localhost:8080/migrations/pending"
        );

        let c = client("http://localhost:8080/my-app/");
        assert_eq!(
            c.url(&["down", "step", "2"]).unwrap().as_str(),
            "http://localhost:8080/my-app/migrations/down/step/2"
        );
    }

    #[test]
    fn test_ids_are_escaped() {
        let c = client("http://localhost:8080");
        assert_eq!(
            c.url(&["up", "add users"]).unwrap().as_str(),
            "http://localhost:8080/migrations/up/add%20users"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            FerryClient::new("not a url", "s"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            FerryClient::new("mailto:ops@example.com", "s"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_server_message() {
        assert_eq!(
            server_message(r#"{"message":"Invalid secret key"}"#),
            "Invalid secret key"
        );
        assert_eq!(server_message("Not Found\n"), "Not Found");
        assert_eq!(server_message(r#"{"error":"x"}"#), r#"{"error":"x"}"#);
    }

    #[test]
    fn test_parse_list() {
        let list = parse_list(
            r#"{"migrations":[{"name":"m1"},{"name":"m2","path":"migrations/m2.sql"}]}"#,
            "migrations",
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], MigrationMeta::named("m1"));
        assert_eq!(
            list[1].path.as_deref(),
            Some(std::path::Path::new("migrations/m2.sql"))
        );

        assert!(matches!(
            parse_list(r#"{"pending":[]}"#, "executed"),
            Err(ClientError::Body(_))
        ));
    }
}
