//! Bridges to the hosted serverless functions
//!
//! Thin request/response wrappers around the externally hosted LLM and email
//! endpoints. The function bodies live elsewhere; this module only owns
//! their client contract and maps transport failures to `Connection` errors.

use avnu_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Assistant interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantKind {
    Chat,
    Venue,
    Voice,
    Welcome,
}

/// Request body for `POST {base}/venue-assistant`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub query: String,
    #[serde(rename = "venueId", skip_serializing_if = "Option::is_none")]
    pub venue_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: AssistantKind,
}

/// Response body from the assistant function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venues: Option<Value>,
}

/// Client for the hosted functions
#[derive(Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
}

impl AssistantClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Ask the venue assistant a question
    pub async fn ask(&self, request: &AssistantRequest) -> Result<AssistantReply> {
        let url = format!("{}/venue-assistant", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("assistant unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Connection(format!(
                "assistant returned {}",
                response.status()
            )));
        }

        response
            .json::<AssistantReply>()
            .await
            .map_err(|e| Error::Connection(format!("malformed assistant reply: {e}")))
    }

    /// Fire-and-forget post to one of the side-effect functions
    /// (`send-otp-email`, `send-booking-invite`, `text-to-speech`)
    ///
    /// Failures are logged and reported to the immediate caller only; they
    /// must never fail a primary flow.
    pub async fn fire_and_forget(&self, function: &str, body: &Value) -> Result<()> {
        let url = format!("{}/{}", self.base_url, function);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("{function} unreachable: {e}")))?;

        if !response.status().is_success() {
            warn!("{} returned {}", function, response.status());
            return Err(Error::Connection(format!(
                "{function} returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_wire_field_names() {
        let request = AssistantRequest {
            query: "rooftop venues in Pune?".into(),
            venue_id: Some("v-7".into()),
            kind: AssistantKind::Chat,
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["venueId"], "v-7");
        assert_eq!(wire["type"], "chat");
        assert!(wire.get("venue_id").is_none());
    }

    #[test]
    fn venue_id_is_omitted_when_absent() {
        let request = AssistantRequest {
            query: "hello".into(),
            venue_id: None,
            kind: AssistantKind::Welcome,
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert!(wire.get("venueId").is_none());
    }

    #[tokio::test]
    async fn fire_and_forget_maps_transport_failure_to_connection() {
        // nothing listens on the discard port
        let client = AssistantClient::new("http://127.0.0.1:9");
        let result = client
            .fire_and_forget("send-booking-invite", &serde_json::json!({"bookingId": "b1"}))
            .await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn ask_maps_transport_failure_to_connection() {
        let client = AssistantClient::new("http://127.0.0.1:9");
        let request = AssistantRequest {
            query: "hello".into(),
            venue_id: None,
            kind: AssistantKind::Chat,
        };
        assert!(matches!(
            client.ask(&request).await,
            Err(Error::Connection(_))
        ));
    }
}
