use std::time::Duration;

use server_api::ApiContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    /// Artificial latency applied to serial number lookups.
    pub(crate) verify_delay: Duration,
}
