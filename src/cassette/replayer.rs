//! Replays recorded interactions from a cassette.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

impl PortMethodKey {
    fn new(port: &str, method: &str) -> Self {
        Self { port: port.to_string(), method: method.to_string() }
    }
}

/// Replays interactions from a loaded cassette, serving them per
/// port/method pair.
pub struct CassetteReplayer {
    /// Per port+method queue of interactions not yet served (in order).
    queues: HashMap<PortMethodKey, VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey::new(&interaction.port, &interaction.method);
            queues.entry(key).or_default().push_back(interaction.clone());
        }
        Self { queues }
    }

    /// Return the first unserved interaction whose recorded input equals
    /// `input`.
    ///
    /// Returns `None` when nothing recorded matches, so a changed invocation
    /// never replays someone else's result.
    pub fn take_matching(
        &mut self,
        port: &str,
        method: &str,
        input: &serde_json::Value,
    ) -> Option<Interaction> {
        let queue = self.queues.get_mut(&PortMethodKey::new(port, method))?;
        let index = queue.iter().position(|interaction| interaction.input == *input);
        if index.is_none() {
            tracing::debug!(port, method, unserved = queue.len(), "no recording matches input");
        }
        queue.remove(index?)
    }

    /// Number of interactions not yet served, across all ports.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}
