/// A waitlist signup address, trimmed and lower-cased.
///
/// Only checks for an `@`; anything stricter would turn away addresses the
/// site has always accepted. Deliverability is never verified here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistEmail(String);

impl WaitlistEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        if !email.contains('@') {
            return Err(format!("Invalid waitlist email: {email:?}"));
        }
        Ok(Self(email.trim().to_lowercase()))
    }
}

impl AsRef<str> for WaitlistEmail {
    fn as_ref(&self) -> &str { &self.0 }
}
