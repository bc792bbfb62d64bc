/**
 * Poll REST Client
 *
 * Thin async wrapper over the server's REST API:
 *
 * - `POST /api/polls`
 * - `GET /api/polls/{shareId}?voterId=`
 * - `POST /api/polls/{shareId}/vote`
 * - `GET /health`
 *
 * Error responses carry an `ErrorBody`, which is turned back into the
 * `PollError` the server produced. Network failures become
 * `PollError::Transport`; unreadable bodies become
 * `PollError::Serialization`.
 */
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::shared::error::ErrorBody;
use crate::shared::poll::{
    validate_new_poll, CreatePollRequest, CreatePollResponse, GetPollResponse, Poll, VoteRequest,
    VoteResponse,
};
use crate::shared::{AppConfig, PollError};

/// REST client for the poll server
#[derive(Debug, Clone)]
pub struct PollApiClient {
    config: AppConfig,
    client: Client,
}

impl PollApiClient {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Configuration this client talks to
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn poll_url(&self, share_id: &str, suffix: Option<&str>) -> Result<Url, PollError> {
        let mut url = Url::parse(&self.config.api_url("/api/polls"))
            .map_err(|e| PollError::validation("serverUrl", e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| PollError::validation("serverUrl", "URL cannot have a path"))?;
            segments.push(share_id);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    /// Create a poll
    ///
    /// The input is validated locally first so obvious mistakes never
    /// reach the network.
    pub async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, PollError> {
        let input = validate_new_poll(question, options)?;
        let request = CreatePollRequest {
            question: input.question,
            options: input.options,
        };

        let response = self
            .client
            .post(self.config.api_url("/api/polls"))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let body: CreatePollResponse = read_json(response).await?;
        Ok(body.poll)
    }

    /// Fetch a poll, including this voter's vote when `voter_id` is given
    pub async fn get_poll(
        &self,
        share_id: &str,
        voter_id: Option<&str>,
    ) -> Result<GetPollResponse, PollError> {
        let mut request = self.client.get(self.poll_url(share_id, None)?);
        if let Some(voter_id) = voter_id {
            request = request.query(&[("voterId", voter_id)]);
        }
        let response = request.send().await.map_err(transport_error)?;
        read_json(response).await
    }

    /// Cast a vote over REST
    pub async fn vote(
        &self,
        share_id: &str,
        option_index: i64,
        voter_id: &str,
    ) -> Result<VoteResponse, PollError> {
        let request = VoteRequest {
            option_index,
            voter_id: voter_id.to_string(),
        };
        let response = self
            .client
            .post(self.poll_url(share_id, Some("vote"))?)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await
    }

    /// Check that the server is up
    pub async fn health(&self) -> Result<(), PollError> {
        let response = self
            .client
            .get(self.config.api_url("/health"))
            .send()
            .await
            .map_err(transport_error)?;
        let _: serde_json::Value = read_json(response).await?;
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> PollError {
    PollError::transport(format!("Network error: {}", err))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PollError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(transport_error)?;

    if status.is_success() {
        return serde_json::from_slice(&bytes).map_err(PollError::from);
    }

    match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => Err(body.into_error()),
        Err(_) => Err(PollError::transport(format!(
            "Server returned {}: {}",
            status,
            String::from_utf8_lossy(&bytes)
        ))),
    }
}
