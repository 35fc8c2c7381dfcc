//! Authenticated user identity.
//!
//! The authentication provider is an external collaborator; all the domain
//! needs from it is "a user identity or none", i.e. `Option<UserIdentity>`.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub uid: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl UserIdentity {
    pub fn new(uid: UserId) -> Self {
        Self {
            uid,
            email: None,
            display_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Whether this user owns a record referencing `owner`.
    pub fn owns(&self, owner: UserId) -> bool {
        self.uid == owner
    }
}
