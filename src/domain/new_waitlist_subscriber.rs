use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::ClientMetadata;
use super::WaitlistEmail;

/// Origin tag for signups made through the website form
pub const WEBSITE_SOURCE: &str = "website";

/// A parsed signup, not yet stored.
pub struct NewWaitlistSubscriber {
    pub email: WaitlistEmail,
    pub source: &'static str,
    pub client: ClientMetadata,
}

impl NewWaitlistSubscriber {
    pub fn from_website(
        email: WaitlistEmail,
        client: ClientMetadata,
    ) -> Self {
        Self {
            email,
            source: WEBSITE_SOURCE,
            client,
        }
    }

    /// The row to insert. Double opt-in is not handled here, so `confirmed`
    /// and `unsubscribed` always start out `false`.
    pub fn to_record(&self) -> WaitlistSubscriber {
        WaitlistSubscriber {
            id: Uuid::new_v4(),
            email: self.email.as_ref().to_string(),
            source: self.source.to_string(),
            ip_address: self.client.ip_address.clone(),
            user_agent: self.client.user_agent.clone(),
            subscribed_at: Utc::now(),
            confirmed: false,
            unsubscribed: false,
        }
    }
}

/// A row of `waitlist_subscribers`, as sent to and returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WaitlistSubscriber {
    pub id: Uuid,
    pub email: String,
    pub source: String,
    pub ip_address: String,
    pub user_agent: String,
    pub subscribed_at: DateTime<Utc>,
    pub confirmed: bool,
    pub unsubscribed: bool,
}
