use std::sync::Mutex;

use shared::domain::Destination;
use tracing::info;

/// Routing collaborator invoked once a flow completes.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: Destination);
}

/// Remembers every requested destination in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Destination>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<Destination> {
        match self.visits.lock() {
            Ok(visits) => visits.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<Destination> {
        self.visits().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: Destination) {
        info!(%destination, "navigation requested");
        match self.visits.lock() {
            Ok(mut visits) => visits.push(destination),
            Err(poisoned) => poisoned.into_inner().push(destination),
        }
    }
}
