use super::Outcome;
use std::cmp::Ordering;

/// A fan-in barrier: forwards only once the expected number of arrivals
/// has been seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkNode {
    expected: usize,
    arrivals: usize,
}

impl SinkNode {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            arrivals: 0,
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn arrivals(&self) -> usize {
        self.arrivals
    }

    /// Records one arrival. Arrivals past the expected count are ignored.
    pub(crate) fn arrive(&mut self, node_id: &str) -> Outcome {
        self.arrivals += 1;
        match self.arrivals.cmp(&self.expected) {
            Ordering::Less => {
                tracing::debug!(
                    id = node_id,
                    arrivals = self.arrivals,
                    expected = self.expected,
                    "Sink waiting for more branches"
                );
                Outcome::Skip
            }
            Ordering::Equal => Outcome::Continue,
            Ordering::Greater => {
                tracing::warn!(
                    id = node_id,
                    arrivals = self.arrivals,
                    expected = self.expected,
                    "Sink already saturated, ignoring arrival"
                );
                Outcome::Skip
            }
        }
    }

    pub(crate) fn rearm(&mut self) {
        self.arrivals = 0;
    }
}
