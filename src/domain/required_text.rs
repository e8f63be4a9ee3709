/// A free-text form field that must not be empty. Whitespace is kept as
/// submitted (a message may span several lines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredText(String);

impl RequiredText {
    pub fn parse(text: String) -> Result<Self, String> {
        match text.is_empty() {
            true => Err("Required field is empty".to_string()),
            false => Ok(Self(text)),
        }
    }
}

impl AsRef<str> for RequiredText {
    fn as_ref(&self) -> &str { &self.0 }
}
