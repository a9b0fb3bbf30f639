//! Admin status tracking.
//!
//! [`AdminStatusTracker`] turns an [`AuthContext`] into an observable
//! [`AdminStatus`]:
//!
//! ```text
//! Unchecked --user present--> Checking --check settles--> Resolved
//!     ^                                                     |
//!     +------------------- user gone -----------------------+
//! ```
//!
//! Every check is stamped with a generation number taken when it is
//! scheduled. A check that settles after a newer check was scheduled, or
//! after the user went away, is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use harbor_core::UserId;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::AdminStatus;
use crate::services::auth::AuthContext;

struct Shared {
    generation: AtomicU64,
    status: watch::Sender<AdminStatus>,
}

/// Observable admin status for the user of an [`AuthContext`].
pub struct AdminStatusTracker {
    context: Arc<dyn AuthContext>,
    checked_user: Option<UserId>,
    shared: Arc<Shared>,
}

impl AdminStatusTracker {
    /// Start tracking `context`.
    ///
    /// The status is seeded from [`AuthContext::is_admin`] and a check is
    /// scheduled right away when a user is signed in.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while a user is signed in.
    #[must_use]
    pub fn new(context: Arc<dyn AuthContext>) -> Self {
        let (status, _) = watch::channel(AdminStatus::resolved(context.is_admin()));
        let mut tracker = Self {
            context,
            checked_user: None,
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                status,
            }),
        };
        tracker.check();
        tracker
    }

    /// Current snapshot.
    #[must_use]
    pub fn status(&self) -> AdminStatus {
        *self.shared.status.borrow()
    }

    /// Receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AdminStatus> {
        self.shared.status.subscribe()
    }

    /// Wait until no check is in flight and return that status.
    pub async fn resolved(&self) -> AdminStatus {
        let mut rx = self.subscribe();
        // The sender lives in `self.shared`, so the channel cannot close here.
        let settled = rx.wait_for(|status| !status.is_checking).await.map(|s| *s);
        settled.unwrap_or_else(|_| self.status())
    }

    /// Re-read the context's user and check again if it changed.
    pub fn sync(&mut self) {
        let current = self.context.user().map(|user| user.id);
        if current != self.checked_user {
            self.check();
        }
    }

    /// Switch to a different context (e.g. a new verification function) and
    /// check again.
    pub fn set_context(&mut self, context: Arc<dyn AuthContext>) {
        self.context = context;
        self.check();
    }

    /// Check again for the current user even if it did not change.
    pub fn refresh(&mut self) {
        self.check();
    }

    fn check(&mut self) {
        let user = self.context.user();
        self.checked_user = user.as_ref().map(|u| u.id.clone());

        let Some(user) = user else {
            self.shared.status.send_modify(|status| {
                self.shared.generation.fetch_add(1, Ordering::SeqCst);
                *status = AdminStatus::NOT_ADMIN;
            });
            return;
        };

        let mut generation = 0;
        self.shared.status.send_modify(|status| {
            generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *status = status.checking();
        });
        debug!(user_id = %user.id, generation, "Scheduling admin check");

        let context = Arc::clone(&self.context);
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let next = match context.check_is_admin().await {
                Ok(is_admin) => AdminStatus::resolved(is_admin),
                Err(err) => {
                    warn!(
                        user_id = %user.id,
                        error = %err,
                        "Admin check failed, treating user as non-admin"
                    );
                    AdminStatus::NOT_ADMIN
                }
            };

            shared.status.send_if_modified(|status| {
                if shared.generation.load(Ordering::SeqCst) != generation {
                    debug!(generation, "Discarding stale admin check");
                    return false;
                }
                let changed = *status != next;
                *status = next;
                changed
            });
        });
    }
}
