/// Best-effort description of who sent a request. Stored alongside a signup,
/// never validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMetadata {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientMetadata {
    /// `forwarded_for` is the raw `x-forwarded-for` value; only its first
    /// (client-most) entry is kept.
    pub fn from_headers(
        forwarded_for: Option<&str>,
        user_agent: Option<&str>,
    ) -> Self {
        let ip_address = forwarded_for
            .filter(|v| !v.is_empty())
            .and_then(|v| v.split(',').next())
            .map(|ip| ip.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            ip_address,
            user_agent: user_agent.unwrap_or_default().to_string(),
        }
    }
}
