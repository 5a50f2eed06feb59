//! User lookup port used to enrich order views.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::CustomerId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The slice of a user record shown alongside an order.
///
/// Only `id` is required; any other field may be null or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: CustomerId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Best-effort lookup of the user behind an order.
///
/// Implementations never fail: an unknown user and an unreachable user
/// service both come back as `None`. Network implementations must bound
/// every call with a timeout.
#[async_trait]
pub trait UserEnrichmentClient: Send + Sync {
    async fn lookup(&self, customer_id: CustomerId) -> Option<UserSummary>;
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashMap<CustomerId, UserSummary>,
    unavailable: bool,
}

/// In-memory user directory for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    state: Arc<RwLock<DirectoryState>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub async fn insert(&self, user: UserSummary) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Simulates the user service being unreachable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Returns how many lookups have been made.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UserEnrichmentClient for InMemoryUserDirectory {
    async fn lookup(&self, customer_id: CustomerId) -> Option<UserSummary> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let state = self.state.read().await;
        if state.unavailable {
            return None;
        }
        state.users.get(&customer_id).cloned()
    }
}
