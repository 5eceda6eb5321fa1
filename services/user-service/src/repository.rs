//! In-memory user storage.

use std::collections::BTreeMap;

use service_base::persistence::{Page, PageRequest};
use tokio::sync::RwLock;

use crate::domain::User;

/// User table kept in process memory, ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<u64, User>,
    last_id: u64,
}

impl InMemoryUserRepository {
    /// Store a new user and assign its id. Returns `None` if the username is taken.
    pub async fn insert(&self, mut user: User) -> Option<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|existing| existing.username == user.username) {
            return None;
        }
        state.last_id += 1;
        user.id = state.last_id;
        state.users.insert(user.id, user.clone());
        Some(user)
    }

    /// Find a user by id.
    pub async fn find(&self, id: u64) -> Option<User> {
        self.state.read().await.users.get(&id).cloned()
    }

    /// Replace a stored user. Returns `false` if it does not exist.
    pub async fn update(&self, user: User) -> bool {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                true
            }
            None => false,
        }
    }

    /// Remove a user. Returns `false` if it did not exist.
    pub async fn delete(&self, id: u64) -> bool {
        self.state.write().await.users.remove(&id).is_some()
    }

    /// One page of users ordered by id.
    pub async fn page(&self, request: &PageRequest) -> Page<User> {
        let state = self.state.read().await;
        let total = state.users.len() as u64;
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let records = state.users.values().skip(skip).take(take).cloned().collect();
        Page::new(records, total, request)
    }
}
