use super::ContactEmail;
use super::RequiredText;

const FOOTER: &str = "Sent from DayRoute website support form";

/// A validated contact-form submission. Never persisted; it is rendered into
/// one outbound email and dropped.
#[derive(Debug)]
pub struct SupportRequest {
    pub name: RequiredText,
    pub email: ContactEmail,
    pub message: RequiredText,
}

impl SupportRequest {
    pub fn subject(&self) -> String { format!("Support Request from {}", self.name.as_ref()) }

    pub fn text_body(&self) -> String {
        format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}\n\n---\n{FOOTER}\n",
            self.name.as_ref(),
            self.email.as_ref(),
            self.message.as_ref(),
        )
    }

    /// All user-supplied fields are entity-encoded before being embedded;
    /// line breaks in the message become `<br>`.
    pub fn html_body(&self) -> String {
        let name = htmlescape::encode_minimal(self.name.as_ref());
        let email = htmlescape::encode_minimal(self.email.as_ref());
        let message = htmlescape::encode_minimal(self.message.as_ref())
            .replace("\r\n", "\n")
            .replace('\n', "<br>");
        format!(
            r#"<h2>Support Request</h2>
<p><strong>Name:</strong> {name}</p>
<p><strong>Email:</strong> {email}</p>
<h3>Message:</h3>
<p>{message}</p>
<hr>
<p style="color: #666; font-size: 12px;">{FOOTER}</p>
"#
        )
    }
}
