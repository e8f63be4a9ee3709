use serde::Deserialize;

/// Call-to-action shown once the app is on the App Store
pub const LIVE_CTA: &str = "Download on App Store";
/// Call-to-action shown before launch
pub const COMING_SOON_CTA: &str = "Coming Soon on App Store";

/// Whether the app is publicly released, and where "download" links should
/// point. Set once per deployment (`release` section of the configuration)
/// and never mutated afterwards; shared with handlers via `web::Data`.
#[derive(Deserialize, Clone, Debug)]
pub struct ReleaseConfig {
    is_live: bool,
    /// Numeric Apple ID from App Store Connect
    apple_app_id: String,
    /// App Store region, e.g. `au`
    storefront: String,
    /// Path segment of the store listing, e.g. `dayroute`
    app_slug: String,
    /// Same-site locator used while the app is not live
    #[serde(default = "default_waitlist_anchor")]
    waitlist_anchor: String,
}

fn default_waitlist_anchor() -> String { "/#waitlist".to_string() }

impl ReleaseConfig {
    pub fn new(
        is_live: bool,
        apple_app_id: &str,
        storefront: &str,
        app_slug: &str,
    ) -> Self {
        Self {
            is_live,
            apple_app_id: apple_app_id.to_string(),
            storefront: storefront.to_string(),
            app_slug: app_slug.to_string(),
            waitlist_anchor: default_waitlist_anchor(),
        }
    }

    pub fn is_live(&self) -> bool { self.is_live }

    pub fn is_coming_soon(&self) -> bool { !self.is_live }

    /// Store listing URL, whether or not the app is live yet.
    pub fn app_store_url(&self) -> String {
        format!(
            "https://apps.apple.com/{}/app/{}/id{}",
            self.storefront, self.app_slug, self.apple_app_id
        )
    }

    /// Deep link to the review sheet of the store listing.
    pub fn review_url(&self) -> String { format!("{}?action=write-review", self.app_store_url()) }

    /// Where "download" links point: the store listing when live, otherwise
    /// the waitlist section of the home page.
    pub fn download_target(&self) -> String {
        match self.is_live {
            true => self.app_store_url(),
            false => self.waitlist_anchor.clone(),
        }
    }

    pub fn download_call_to_action(&self) -> &'static str {
        match self.is_live {
            true => LIVE_CTA,
            false => COMING_SOON_CTA,
        }
    }
}
