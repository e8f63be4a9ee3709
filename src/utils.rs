use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Print an error and every `source` beneath it, one per line. Used for the
/// `Debug` impl of handler errors, which `TracingLogger` records on the
/// request span.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// `{"error": message}` with the given status. `message` must be safe to show
/// to callers; internal detail belongs in the logs.
pub fn error_json(
    status: StatusCode,
    message: &str,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody { error: message })
}

/// Parse a JSON object request body whatever its `Content-Type`. Any failure
/// here is treated as unexpected by the handlers (not as a validation error).
///
/// Only objects are accepted: derived struct deserializers would otherwise
/// also take a positional array like `["jo@example.com"]`.
pub fn parse_json_body<T>(body: &[u8]) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let value: Value =
        serde_json::from_slice(body).context("could not parse request body as JSON")?;
    if !value.is_object() {
        anyhow::bail!("request body is not a JSON object");
    }
    serde_json::from_value(value).context("unexpected request body shape")
}
