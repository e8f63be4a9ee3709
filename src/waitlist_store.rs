use std::fmt::Debug;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::NewWaitlistSubscriber;
use crate::domain::WaitlistSubscriber;
use crate::utils::error_chain_fmt;

/// Postgres SQLSTATE for `unique_violation`; the REST API forwards it as-is.
pub const UNIQUE_VIOLATION: &str = "23505";

const TABLE: &str = "waitlist_subscribers";

#[derive(thiserror::Error)]
pub enum StoreError {
    /// A row with the same (normalised) email already exists
    #[error("Email already on the waitlist")]
    Conflict,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl Debug for StoreError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Where waitlist signups are persisted. Uniqueness of `email` is enforced by
/// the backend, never checked here, so concurrent inserts of one address
/// yield exactly one success and one `Conflict`.
pub enum WaitlistStore {
    Rest(RestStore),
    Postgres(PgPool),
}

impl WaitlistStore {
    /// Insert one subscriber (a single attempt, no retry) and return the rows
    /// the backend reports as inserted.
    #[tracing::instrument(
        name = "INSERTing waitlist subscriber",
        skip(self, new_sub),
        fields(backend = self.backend_name())
    )]
    pub async fn insert(
        &self,
        new_sub: &NewWaitlistSubscriber,
    ) -> Result<Vec<WaitlistSubscriber>, StoreError> {
        match self {
            Self::Rest(store) => store.insert(new_sub).await,
            Self::Postgres(pool) => insert_pg(pool, new_sub).await,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Rest(_) => "rest",
            Self::Postgres(_) => "postgres",
        }
    }
}

/// Hosted database exposing a PostgREST-style API, authenticated with a
/// public ("anon") key.
pub struct RestStore {
    http_client: Client,
    base_url: String,
    anon_key: Secret<String>,
}

/// Error body returned by the REST API
#[derive(Deserialize, Debug)]
struct RestError {
    code: Option<String>,
    message: Option<String>,
}

impl RestStore {
    pub fn new(
        base_url: String,
        anon_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("could not build REST store client")?;
        Ok(Self {
            http_client,
            base_url,
            anon_key,
        })
    }

    async fn insert(
        &self,
        new_sub: &NewWaitlistSubscriber,
    ) -> Result<Vec<WaitlistSubscriber>, StoreError> {
        let url = format!("{}/rest/v1/{TABLE}", self.base_url.trim_end_matches('/'));
        let resp = self
            .http_client
            .post(&url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(self.anon_key.expose_secret())
            // echo the inserted row(s) back
            .header("Prefer", "return=representation")
            .json(&new_sub.to_record())
            .send()
            .await
            .context("could not reach waitlist store")?;

        let status = resp.status();
        if status.is_success() {
            let rows = resp
                .json::<Vec<WaitlistSubscriber>>()
                .await
                .context("could not decode inserted rows")?;
            return Ok(rows);
        }

        let body = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<RestError>(&body) {
            Ok(RestError {
                code: Some(code), ..
            }) if code == UNIQUE_VIOLATION => Err(StoreError::Conflict),
            Ok(err) => Err(anyhow::anyhow!(
                "waitlist store returned {status}: code={:?} message={:?}",
                err.code,
                err.message
            )
            .into()),
            Err(_) => Err(rest_status_error(status, &body).into()),
        }
    }
}

fn rest_status_error(
    status: StatusCode,
    body: &str,
) -> anyhow::Error {
    anyhow::anyhow!("waitlist store returned {status}: {body}")
}

async fn insert_pg(
    pool: &PgPool,
    new_sub: &NewWaitlistSubscriber,
) -> Result<Vec<WaitlistSubscriber>, StoreError> {
    let record = new_sub.to_record();
    let row = sqlx::query_as::<_, WaitlistSubscriber>(
        r#"
    INSERT INTO waitlist_subscribers
        (id, email, source, ip_address, user_agent, subscribed_at, confirmed, unsubscribed)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id, email, source, ip_address, user_agent, subscribed_at, confirmed, unsubscribed
"#,
    )
    .bind(record.id)
    .bind(&record.email)
    .bind(&record.source)
    .bind(&record.ip_address)
    .bind(&record.user_agent)
    .bind(record.subscribed_at)
    .bind(record.confirmed)
    .bind(record.unsubscribed)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict
        }
        e => StoreError::Unexpected(anyhow::Error::new(e).context("bad query")),
    })?;
    Ok(vec![row])
}
