mod health_check;
mod support;
mod waitlist;
pub use health_check::*;
pub use support::*;
pub use waitlist::*;
