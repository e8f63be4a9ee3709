use std::fmt::Debug;

use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::ClientMetadata;
use crate::domain::NewWaitlistSubscriber;
use crate::domain::WaitlistEmail;
use crate::domain::WaitlistSubscriber;
use crate::utils::error_chain_fmt;
use crate::utils::error_json;
use crate::utils::parse_json_body;
use crate::waitlist_store::StoreError;
use crate::waitlist_store::WaitlistStore;

/// Body of `POST /api/waitlist`. `email` is optional here so that a missing
/// field is reported as a validation error rather than a parse failure.
#[derive(Deserialize)]
pub struct WaitlistForm {
    email: Option<String>,
}

impl TryFrom<WaitlistForm> for WaitlistEmail {
    type Error = String;
    fn try_from(value: WaitlistForm) -> Result<Self, Self::Error> {
        let email = value.email.ok_or("No email".to_string())?;
        WaitlistEmail::parse(email)
    }
}

#[derive(Serialize)]
struct Joined {
    message: &'static str,
    data: Vec<WaitlistSubscriber>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AlreadyJoined {
    message: &'static str,
    already_exists: bool,
}

/// `Display` is what callers see; the `source` chain only goes to the logs.
#[derive(thiserror::Error)]
pub enum WaitlistError {
    #[error("Valid email is required")]
    ValidationError,
    #[error("Failed to join waitlist")]
    StoreError(#[source] anyhow::Error),
    #[error("Server error")]
    UnexpectedError(#[source] anyhow::Error),
}

impl Debug for WaitlistError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for WaitlistError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::StoreError(_) | Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse { error_json(self.status_code(), &self.to_string()) }
}

/// `POST /api/waitlist`
///
/// Records a signup once per (normalised) email. A repeated signup is not an
/// error: it returns 200 with `alreadyExists: true`.
///
/// # Request example
///
/// ```sh
///     curl -i -H 'Content-Type: application/json' \
///         -d '{"email":"jo@example.com"}' http://127.0.0.1:8000/api/waitlist
/// ```
#[tracing::instrument(
    name = "Adding waitlist subscriber",
    skip(request, body, store),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn join_waitlist(
    request: HttpRequest,
    body: web::Bytes,
    store: web::Data<WaitlistStore>,
) -> Result<HttpResponse, WaitlistError> {
    let form: WaitlistForm = parse_json_body(&body).map_err(|e| {
        tracing::error!(error.cause_chain = ?e, "Waitlist API error");
        WaitlistError::UnexpectedError(e)
    })?;

    let email: WaitlistEmail = form.try_into().map_err(|e: String| {
        tracing::debug!("{e}");
        WaitlistError::ValidationError
    })?;
    tracing::Span::current().record("subscriber_email", tracing::field::display(email.as_ref()));

    let headers = request.headers();
    // stored as sent, even when not visible ASCII
    let user_agent = headers
        .get(header::USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()));
    let client = ClientMetadata::from_headers(
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok()),
        user_agent.as_deref(),
    );
    let new_sub = NewWaitlistSubscriber::from_website(email, client);

    match store.insert(&new_sub).await {
        Ok(data) => Ok(HttpResponse::Created().json(Joined {
            message: "Successfully joined the waitlist!",
            data,
        })),
        Err(StoreError::Conflict) => {
            tracing::info!("email already on the waitlist");
            Ok(HttpResponse::Ok().json(AlreadyJoined {
                message: "Email already on the waitlist",
                already_exists: true,
            }))
        }
        Err(StoreError::Unexpected(e)) => {
            tracing::error!(error.cause_chain = ?e, error.message = %e, "Waitlist store error");
            Err(WaitlistError::StoreError(e))
        }
    }
}
