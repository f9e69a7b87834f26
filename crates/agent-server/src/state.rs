use crate::tracker::RequestTracker;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<RequestTracker>,
}

impl AppState {
    pub fn new(tracker: Arc<RequestTracker>) -> Self {
        Self { tracker }
    }
}
