use crate::config::Config;
use crate::participant::Participant;
use async_trait::async_trait;
use derive_more::{Display, From};
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Banner text for a failure which carries no message of its own
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to fetch participants";

/// User-Agent header for outgoing requests
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, From, Display)]
pub enum FetchError {
    /// Connection, DNS or timeout failure before a response arrived
    #[display(fmt = "Unable to reach progress service: {}", _0)]
    Transport(reqwest::Error),
    /// The service answered with a non-success status
    #[display(fmt = "Progress service responded with status {}", _0)]
    #[from(ignore)]
    Status(StatusCode),
    /// The body was not the expected JSON
    #[display(fmt = "Malformed participant data: {}", _0)]
    Parse(serde_json::Error),
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Other(String),
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Text for the dashboard error banner. All failures are shown
    /// the same way regardless of kind
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Whether the failure happened before the service responded
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Somewhere the dashboard can load participants from
#[async_trait]
pub trait ParticipantSource: Send + Sync + 'static {
    async fn fetch(&self) -> FetchResult<Vec<Participant>>;
}

#[derive(Deserialize)]
struct ParticipantFeed {
    #[serde(default)]
    participants: Option<Vec<Participant>>,
}

/// Parses a `/participants` response body. A missing participants
/// field is an empty list
pub fn parse_feed(body: &str) -> FetchResult<Vec<Participant>> {
    let feed: ParticipantFeed = serde_json::from_str(body)?;
    Ok(feed.participants.unwrap_or_default())
}

/// Joins the service base URL with the participants endpoint
pub fn participants_url(base_url: &str) -> String {
    format!("{}/participants", base_url.trim_end_matches('/'))
}

/// Loads participants over HTTP from the progress service
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(config: &Config) -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            url: participants_url(&config.api_url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ParticipantSource for HttpSource {
    async fn fetch(&self) -> FetchResult<Vec<Participant>> {
        debug!("GET {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.text().await?;
        parse_feed(&body)
    }
}
