use std::sync::Arc;
use std::sync::Mutex;

use dayroute_site::configuration::get_configuration;
use dayroute_site::configuration::DatabaseSettings;
use dayroute_site::configuration::Settings;
use dayroute_site::configuration::StoreBackend;
use dayroute_site::startup::Application;
use dayroute_site::telemetry::get_subscriber;
use dayroute_site::telemetry::init_subscriber;
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::Value;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;
use uuid::Uuid;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::Request;
use wiremock::Respond;
use wiremock::ResponseTemplate;

/// Init the tracing subscriber once for the whole test binary.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different closure types, hence the two arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber).expect("init tracing");
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber).expect("init tracing");
        }
    };
});

pub const WAITLIST_TABLE_PATH: &str = "/rest/v1/waitlist_subscribers";

/// In-memory stand-in for the hosted `waitlist_subscribers` table: inserts
/// are echoed back with 201, a second row with the same `email` is rejected
/// with 409 / `23505` like the real unique constraint.
#[derive(Clone, Default)]
pub struct FakeWaitlistTable {
    pub rows: Arc<Mutex<Vec<Value>>>,
}

impl Respond for FakeWaitlistTable {
    fn respond(
        &self,
        request: &Request,
    ) -> ResponseTemplate {
        let Ok(row) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(400);
        };
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r["email"] == row["email"]) {
            return ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "code": "23505",
                "details": "Key (email) already exists.",
                "hint": null,
                "message": "duplicate key value violates unique constraint",
            }));
        }
        rows.push(row.clone());
        ResponseTemplate::new(201).set_body_json(vec![row])
    }
}

pub struct TestApp {
    pub addr: String,
    pub port: u16,
    /// Simulates the hosted database API
    pub store_server: MockServer,
    /// Simulates the transactional email API
    pub email_server: MockServer,
    pub waitlist: FakeWaitlistTable,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_waitlist(
        &self,
        body: &Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/waitlist", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    /// For bodies that are not (valid) JSON, or odd content types
    pub async fn post_waitlist_raw(
        &self,
        body: &str,
        content_type: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/waitlist", self.addr))
            .header("Content-Type", content_type)
            .body(body.to_string())
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_support(
        &self,
        body: &Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/support", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_support_raw(
        &self,
        body: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/support", self.addr))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("execute request")
    }

    pub fn stored_rows(&self) -> Vec<Value> { self.waitlist.rows.lock().unwrap().clone() }

    /// JSON bodies of every request the email API received
    pub async fn sent_emails(&self) -> Vec<Value> {
        self.email_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}

/// Default config pointed at the mock servers, with a random port.
fn test_configuration(
    store_server: &MockServer,
    email_server: &MockServer,
    with_email: bool,
) -> Settings {
    let mut cfg = get_configuration().expect("read configuration");

    // port 0: the OS assigns a free port, retrieved later via `get_port`
    cfg.application.port = 0;

    cfg.waitlist.backend = StoreBackend::Rest;
    let rest = cfg.waitlist.rest.as_mut().expect("rest store settings");
    rest.base_url = store_server.uri();
    rest.anon_key = Secret::new("test-anon-key".to_string());
    rest.timeout_milliseconds = 2000;

    cfg.support_email.base_url = email_server.uri();
    cfg.support_email.timeout_milliseconds = 2000;
    // set explicitly, so that a key in the environment can't leak in
    cfg.support_email.api_key = match with_email {
        true => Some(Secret::new("test-email-key".to_string())),
        false => None,
    };
    cfg
}

async fn launch(cfg: Settings) -> (String, u16) {
    let app = Application::build(cfg).await.expect("build app");
    let port = app.get_port();
    tokio::spawn(app.run_until_stopped());
    (format!("http://127.0.0.1:{port}"), port)
}

async fn spawn(with_email: bool) -> TestApp {
    Lazy::force(&TRACING);

    let store_server = MockServer::start().await;
    let email_server = MockServer::start().await;

    let waitlist = FakeWaitlistTable::default();
    Mock::given(path(WAITLIST_TABLE_PATH))
        .and(method("POST"))
        .respond_with(waitlist.clone())
        .mount(&store_server)
        .await;

    let cfg = test_configuration(&store_server, &email_server, with_email);
    let (addr, port) = launch(cfg).await;

    TestApp {
        addr,
        port,
        store_server,
        email_server,
        waitlist,
        api_client: reqwest::Client::new(),
    }
}

/// App with the email API key configured
pub async fn spawn_app() -> TestApp { spawn(true).await }

/// App without an email API key; support requests are only logged
pub async fn spawn_app_without_email() -> TestApp { spawn(false).await }

/// Create a db with a random name and run the migrations in `./migrations`.
async fn configure_database(cfg: &DatabaseSettings) -> PgPool {
    let mut conn = PgConnection::connect_with(&cfg.connection_without_db())
        .await
        .expect("postgres must be running");
    conn.execute(format!(r#"CREATE DATABASE "{}";"#, cfg.database_name).as_str())
        .await
        .unwrap();

    let pool = PgPool::connect_with(cfg.connection()).await.unwrap();
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("failed to migrate");
    pool
}

pub struct PgTestApp {
    pub addr: String,
    pub pool: PgPool,
    pub api_client: reqwest::Client,
}

/// App backed by a real (fresh) Postgres database instead of the REST mock
pub async fn spawn_app_with_postgres() -> PgTestApp {
    Lazy::force(&TRACING);

    let store_server = MockServer::start().await;
    let email_server = MockServer::start().await;
    let mut cfg = test_configuration(&store_server, &email_server, false);

    cfg.waitlist.backend = StoreBackend::Postgres;
    let db = cfg.waitlist.database.as_mut().expect("database settings");
    db.database_name = Uuid::new_v4().to_string();
    let pool = configure_database(db).await;

    let (addr, _) = launch(cfg).await;
    PgTestApp {
        addr,
        pool,
        api_client: reqwest::Client::new(),
    }
}
