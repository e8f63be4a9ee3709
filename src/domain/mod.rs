mod client_metadata;
mod contact_email;
mod new_waitlist_subscriber;
mod required_text;
mod support_request;
mod waitlist_email;
// allow external `use` statements to skip `waitlist_email` etc
pub use client_metadata::ClientMetadata;
pub use contact_email::ContactEmail;
pub use new_waitlist_subscriber::NewWaitlistSubscriber;
pub use new_waitlist_subscriber::WaitlistSubscriber;
pub use required_text::RequiredText;
pub use support_request::SupportRequest;
pub use waitlist_email::WaitlistEmail;
