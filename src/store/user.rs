use std::sync::RwLock;

use tracing::{debug, error};

use crate::api::UsersApi;
use crate::model::User;

use super::{read, write, Cache};

const FETCH_FAILED: &str = "Failed to fetch users";

/// Read-only cache of users.
#[derive(Debug)]
pub struct UserStore {
    api: UsersApi,
    state: RwLock<Cache<User>>,
}

impl UserStore {
    pub fn new(api: UsersApi) -> Self {
        Self {
            api,
            state: RwLock::new(Cache::default()),
        }
    }

    pub async fn fetch_all(&self) {
        write(&self.state).begin_load();
        let result = self.api.get_all().await;

        let mut state = write(&self.state);
        state.loading = false;
        match result {
            Ok(envelope) => {
                debug!(count = envelope.data.len(), "users fetched");
                state.items = envelope.data;
            }
            Err(err) => {
                error!(error = %err, "{FETCH_FAILED}");
                state.error = Some(FETCH_FAILED.to_string());
            }
        }
    }

    pub fn get_by_id(&self, user_id: &str) -> Option<User> {
        read(&self.state)
            .items
            .iter()
            .find(|user| user.id == user_id)
            .cloned()
    }

    pub fn users(&self) -> Vec<User> {
        read(&self.state).items.clone()
    }

    pub fn is_loading(&self) -> bool {
        read(&self.state).loading
    }

    pub fn error(&self) -> Option<String> {
        read(&self.state).error.clone()
    }

    pub fn clear(&self) {
        *write(&self.state) = Cache::default();
    }
}
