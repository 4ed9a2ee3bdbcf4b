//! Shared handler state, built once by the server bootstrap.

use std::sync::Arc;

use super::{users::UserStore, views::Views};

pub struct AppState {
    users: Arc<dyn UserStore>,
    views: Views,
}

impl AppState {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, views: Views) -> Self {
        Self { users, views }
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    #[must_use]
    pub fn views(&self) -> &Views {
        &self.views
    }
}
