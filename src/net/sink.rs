//! Delivery sink: receives `(start, completion)` once per delivered package.

use std::sync::{Arc, Mutex};

use crate::sim::SimTime;

pub trait DeliverySink: Send {
    fn record(&mut self, start: SimTime, completion: SimTime);
}

/// Keeps every delivery in arrival order.
#[derive(Debug, Default, Clone)]
pub struct DeliveryLog {
    pub records: Vec<(SimTime, SimTime)>,
}

impl DeliveryLog {
    /// Delivery durations in virtual-time units.
    pub fn durations(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|(start, done)| done.saturating_sub(*start).as_secs_f64())
            .collect()
    }
}

impl DeliverySink for DeliveryLog {
    fn record(&mut self, start: SimTime, completion: SimTime) {
        self.records.push((start, completion));
    }
}

/// Lets the caller keep a handle on the sink while the network owns a clone.
impl<S: DeliverySink> DeliverySink for Arc<Mutex<S>> {
    fn record(&mut self, start: SimTime, completion: SimTime) {
        match self.lock() {
            Ok(mut sink) => sink.record(start, completion),
            Err(poisoned) => poisoned.into_inner().record(start, completion),
        }
    }
}
