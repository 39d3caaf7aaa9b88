//! Per-identity event serialization.
//!
//! Each identity gets a lane, a small async mutex created on first use and
//! reclaimed once nothing references it. Events for one identity are handled
//! in arrival order; different identities proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as Lane;

use crate::events::{InboundEvent, OutboundRender};
use crate::flows::Engine;
use crate::repository::Repository;

pub struct Dispatcher<R> {
    engine: Arc<Engine<R>>,
    lanes: Mutex<HashMap<i64, Arc<Lane<()>>>>,
}

impl<R: Repository> Dispatcher<R> {
    pub fn new(engine: Arc<Engine<R>>) -> Self {
        Self {
            engine,
            lanes: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    pub async fn dispatch(&self, event: InboundEvent) -> Vec<OutboundRender> {
        let user = event.user.0;
        let lane = self.lane(user);
        let rendered = {
            let _serialized = lane.lock().await;
            self.engine.handle(event)
        };
        drop(lane);
        self.reclaim(user);
        rendered
    }

    fn lane(&self, user: i64) -> Arc<Lane<()>> {
        let mut lanes = self.lanes.lock().expect("lane mutex poisoned");
        lanes.entry(user).or_default().clone()
    }

    /// Drops the lane once the map holds the only reference.
    fn reclaim(&self, user: i64) {
        let mut lanes = self.lanes.lock().expect("lane mutex poisoned");
        if let Some(lane) = lanes.get(&user) {
            if Arc::strong_count(lane) == 1 {
                lanes.remove(&user);
            }
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.lock().expect("lane mutex poisoned").len()
    }
}
