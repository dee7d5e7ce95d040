//! Application state shared by the control handlers.

use std::sync::Arc;

use switchover_core::Scheduler;

use crate::profile::Profile;

/// Cloneable handle to the server's shared state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    scheduler: Arc<Scheduler<Profile>>,
}

impl AppState {
    pub fn new(scheduler: Arc<Scheduler<Profile>>) -> Self {
        Self { inner: Arc::new(AppStateInner { scheduler }) }
    }

    pub fn scheduler(&self) -> &Scheduler<Profile> {
        &self.inner.scheduler
    }
}
