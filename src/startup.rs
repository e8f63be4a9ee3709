use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::release::ReleaseConfig;
use crate::routes::contact_support;
use crate::routes::health_check;
use crate::routes::join_waitlist;
use crate::waitlist_store::WaitlistStore;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Resolve collaborators from `cfg`, bind the listener, and build the
    /// `Server` (not yet running).
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(&addr).with_context(|| format!("could not bind {addr}"))?;

        // port 0 means the OS picked one; keep it for callers
        let port = listener.local_addr()?.port();

        let store = cfg.waitlist.store()?;
        let mailer = cfg.support_email.client()?;

        tracing::info!(
            port,
            waitlist_backend = store.backend_name(),
            support_inbox = mailer.as_ref().map(EmailClient::inbox).unwrap_or("<logging only>"),
            is_live = cfg.release.is_live(),
            download_target = %cfg.release.download_target(),
            "starting server"
        );

        let server = run(listener, store, mailer, cfg.release)?;
        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The email client, if an API key was configured. Wrapped so that it is
/// unambiguous as `Data`.
pub struct SupportMailer(pub Option<EmailClient>);

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    store: WaitlistStore,
    mailer: Option<EmailClient>,
    release: ReleaseConfig,
) -> Result<Server, anyhow::Error> {
    // `Data` is externally an `Arc` (for sharing/cloning). every worker runs its own copy of
    // the `App` built by the closure below, so shared state must be cloneable
    let store = Data::new(store);
    let mailer = Data::new(SupportMailer(mailer));
    let release = Data::new(release);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .route("/waitlist", web::post().to(join_waitlist))
                    .route("/support", web::post().to(contact_support)),
            )
            .app_data(store.clone())
            .app_data(mailer.clone())
            // read-only, for whatever renders the pages
            .app_data(release.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
