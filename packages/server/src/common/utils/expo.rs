use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Expo Push Notification Client
///
/// Delivers governance notifications (warnings, case openings, decisions) to
/// members' devices. Delivery is best-effort everywhere this client is used:
/// callers log failures and never roll back state because of them.
pub struct ExpoClient {
    client: Client,
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExpoMessage {
    to: String,
    title: String,
    body: String,
    data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    data: Vec<ExpoTicket>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    #[allow(dead_code)]
    id: Option<String>,
    #[allow(dead_code)]
    message: Option<String>,
}

impl ExpoClient {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            access_token,
        }
    }

    /// Send a single push notification to an Expo push token.
    pub async fn send(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        let message = ExpoMessage {
            to: push_token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data,
            sound: Some("default".to_string()),
        };

        let mut request = self
            .client
            .post("https://exp.host/--/api/v2/push/send")
            .json(&message);

        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        info!("Sending Expo push notification to: {}", push_token);

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            error!("Expo push failed {}: {}", status, body);
            anyhow::bail!("Expo push API error {}: {}", status, body);
        }

        let expo_response: ExpoResponse = response.json().await?;

        for ticket in &expo_response.data {
            if ticket.status == "error" {
                error!("Expo ticket error: {:?}", ticket);
                anyhow::bail!("Expo ticket error: {:?}", ticket);
            }
        }

        Ok(())
    }

    /// Send multiple notifications in one request (up to 100).
    ///
    /// Per-ticket errors are logged but do not fail the batch: one member's
    /// stale token must not block the rest of the committee being notified.
    pub async fn send_many(
        &self,
        notifications: Vec<(&str, &str, &str, serde_json::Value)>,
    ) -> Result<()> {
        if notifications.is_empty() {
            return Ok(());
        }

        let messages: Vec<ExpoMessage> = notifications
            .into_iter()
            .map(|(token, title, body, data)| ExpoMessage {
                to: token.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                data,
                sound: Some("default".to_string()),
            })
            .collect();

        let mut request = self
            .client
            .post("https://exp.host/--/api/v2/push/send")
            .json(&messages);

        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        info!("Sending batch of {} Expo push notifications", messages.len());

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            error!("Expo batch push failed {}: {}", status, body);
            anyhow::bail!("Expo push API error {}: {}", status, body);
        }

        let expo_response: ExpoResponse = response.json().await?;

        let errors = expo_response
            .data
            .iter()
            .filter(|t| t.status == "error")
            .count();
        if errors > 0 {
            error!(
                "{} out of {} notifications failed",
                errors,
                expo_response.data.len()
            );
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::kernel::traits::BasePushNotificationService for ExpoClient {
    async fn send_notification(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        self.send(push_token, title, body, data).await
    }

    async fn send_batch(
        &self,
        notifications: Vec<(&str, &str, &str, serde_json::Value)>,
    ) -> Result<()> {
        self.send_many(notifications).await
    }
}
