//! Client configuration.

use std::time::Duration;

use rangetable_proto::ServerAddress;

/// Scalar knobs consumed by the client core.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the cluster master.
    pub master_address: ServerAddress,
    /// Sleep between retry attempts.
    pub pause: Duration,
    /// Bound on retry attempts for every retried operation.
    pub retries: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            master_address: ServerAddress::from("127.0.0.1:60000"),
            pause: Duration::from_millis(30_000),
            retries: 5,
        }
    }
}

impl ClientConfig {
    /// The retry bound, never less than one attempt.
    pub(crate) fn attempts(&self) -> usize {
        self.retries.max(1)
    }
}
