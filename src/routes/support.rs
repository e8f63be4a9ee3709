use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::ContactEmail;
use crate::domain::RequiredText;
use crate::domain::SupportRequest;
use crate::startup::SupportMailer;
use crate::utils::error_chain_fmt;
use crate::utils::error_json;
use crate::utils::parse_json_body;

/// Body of `POST /api/support`. Fields are optional so that missing ones are
/// reported as validation errors.
#[derive(Deserialize)]
pub struct SupportForm {
    name: Option<String>,
    email: Option<String>,
    message: Option<String>,
}

// all three fields are checked for presence before the email shape is
impl TryFrom<SupportForm> for SupportRequest {
    type Error = SupportError;
    fn try_from(value: SupportForm) -> Result<Self, Self::Error> {
        let required = |field: Option<String>| {
            RequiredText::parse(field.unwrap_or_default()).map_err(|_| SupportError::MissingFields)
        };
        let name = required(value.name)?;
        let email = required(value.email)?;
        let message = required(value.message)?;

        let email = ContactEmail::parse(email.as_ref().to_string()).map_err(|e| {
            tracing::debug!("{e}");
            SupportError::InvalidEmail
        })?;

        Ok(SupportRequest {
            name,
            email,
            message,
        })
    }
}

#[derive(Serialize)]
struct Sent {
    success: bool,
}

#[derive(thiserror::Error)]
pub enum SupportError {
    #[error("Name, email, and message are required")]
    MissingFields,
    #[error("Please provide a valid email address")]
    InvalidEmail,
    /// Covers both delivery failures and malformed requests; callers get the
    /// same retry-later message either way.
    #[error("Failed to send message. Please try again later.")]
    UnexpectedError(#[source] anyhow::Error),
}

impl Debug for SupportError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SupportError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFields | Self::InvalidEmail => StatusCode::BAD_REQUEST,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse { error_json(self.status_code(), &self.to_string()) }
}

/// `POST /api/support`
///
/// Relays a contact-form submission to the support inbox. Without an email
/// API key the submission is only logged, and the caller still gets 200.
///
/// # Request example
///
/// ```sh
///     curl -i -H 'Content-Type: application/json' \
///         -d '{"name":"Jo","email":"jo@example.com","message":"Hi"}' \
///         http://127.0.0.1:8000/api/support
/// ```
#[tracing::instrument(name = "Handling support request", skip(body, mailer))]
pub async fn contact_support(
    body: web::Bytes,
    mailer: web::Data<SupportMailer>,
) -> Result<HttpResponse, SupportError> {
    let form: SupportForm = parse_json_body(&body).map_err(|e| {
        tracing::error!(error.cause_chain = ?e, "Support form error");
        SupportError::UnexpectedError(e)
    })?;
    let request: SupportRequest = form.try_into()?;

    let Some(email_client) = &mailer.0 else {
        tracing::info!(
            support_name = %request.name.as_ref(),
            support_email = %request.email.as_ref(),
            support_message = %request.message.as_ref(),
            "Support form submission (no email configured)"
        );
        return Ok(HttpResponse::Ok().json(Sent { success: true }));
    };

    if let Err(e) = email_client.send_support_request(&request).await {
        let e = anyhow::Error::new(e).context("could not relay support request");
        tracing::error!(error.cause_chain = ?e, error.message = %e, "Support form error");
        return Err(SupportError::UnexpectedError(e));
    }
    Ok(HttpResponse::Ok().json(Sent { success: true }))
}
