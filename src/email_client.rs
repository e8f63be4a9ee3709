use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Serialize;

use crate::domain::SupportRequest;

/// Client for a transactional email HTTP API (`POST {base_url}/emails`).
///
/// Establishing a HTTP connection is expensive, so a single `Client` is built
/// at startup and shared across requests.
#[derive(Clone)]
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    /// `From` header, display-name form allowed
    sender: String,
    /// Support inbox all requests are relayed to
    inbox: String,
    api_key: Secret<String>,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: String,
        inbox: String,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            sender,
            inbox,
            api_key,
        })
    }

    pub fn inbox(&self) -> &str { &self.inbox }

    /// Single attempt; non-2xx responses are errors.
    pub async fn send_email(
        &self,
        reply_to: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/emails", self.base_url.trim_end_matches('/'));
        let body = SendEmailRequest {
            from: &self.sender,
            to: [self.inbox.as_str()],
            reply_to,
            subject,
            text: text_content,
            html: html_content,
        };
        self.http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Relay a support request to the support inbox, with replies going to
    /// the submitter.
    #[tracing::instrument(
        name = "Relaying support request",
        skip(self, request),
        fields(support_email = %request.email.as_ref())
    )]
    pub async fn send_support_request(
        &self,
        request: &SupportRequest,
    ) -> Result<(), reqwest::Error> {
        self.send_email(
            request.email.as_ref(),
            &request.subject(),
            &request.html_body(),
            &request.text_body(),
        )
        .await
    }
}
