use std::sync::Arc;

use birdwatch_core::Config;
use birdwatch_observer::Observer;
use birdwatch_queue::Queue;

#[derive(Clone)]
pub struct AppState {
    pub queue: Queue,
    pub observer: Observer,
    pub config: Arc<Config>,
}
