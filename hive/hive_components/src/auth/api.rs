//! Events published by the `auth` component.

use hive_event::{Event, EventKey};

/// A user logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEvent {
    pub username: String,
}

impl Event for LoginEvent {
    const KEY: EventKey = EventKey::new("auth.login");
}
