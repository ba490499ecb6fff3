//! Signed-in identity and its change notifications.
//!
//! Transitions are delivered to each subscriber in publication order. A
//! subscriber that falls behind by more than the channel capacity skips the
//! oldest transitions; the last one it receives is always the current value.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

const TRANSITION_CAPACITY: usize = 32;

/// The authenticated actor on whose behalf cart and order operations run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: String,
}

impl Identity {
    pub fn new(user_id: Uuid, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }
}

impl From<&AuthUser> for Identity {
    fn from(user: &AuthUser) -> Self {
        Self::new(user.user_id, user.role.clone())
    }
}

#[derive(Clone)]
pub struct IdentityHub {
    current: watch::Sender<Option<Identity>>,
    transitions: broadcast::Sender<Option<Identity>>,
}

impl Default for IdentityHub {
    fn default() -> Self {
        Self::new(None)
    }
}

impl IdentityHub {
    pub fn new(initial: Option<Identity>) -> Self {
        let (current, _) = watch::channel(initial);
        let (transitions, _) = broadcast::channel(TRANSITION_CAPACITY);
        Self {
            current,
            transitions,
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self::new(Some(identity))
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn sign_in(&self, identity: Identity) {
        self.publish(Some(identity));
    }

    pub fn sign_out(&self) {
        self.publish(None);
    }

    pub fn subscribe(&self) -> IdentitySubscription {
        IdentitySubscription {
            receiver: self.transitions.subscribe(),
        }
    }

    fn publish(&self, identity: Option<Identity>) {
        tracing::debug!(
            user_id = ?identity.as_ref().map(|i| i.user_id),
            "identity changed"
        );
        self.current.send_replace(identity.clone());
        // No subscribers is fine.
        let _ = self.transitions.send(identity);
    }
}

/// Registration on an [`IdentityHub`]. Dropping it, or calling
/// [`unsubscribe`](Self::unsubscribe), stops delivery.
pub struct IdentitySubscription {
    receiver: broadcast::Receiver<Option<Identity>>,
}

impl IdentitySubscription {
    /// Next transition, or `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<Option<Identity>> {
        loop {
            match self.receiver.recv().await {
                Ok(identity) => return Some(identity),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "identity subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
