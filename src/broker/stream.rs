use std::collections::HashSet;

use super::message::Message;

/// A named, append-only sequence of messages plus the set of consumer
/// groups currently attached to it.
#[derive(Default)]
pub struct StreamState {
    pub messages: Vec<Message>,
    pub groups: HashSet<String>,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_group(&mut self, name: &str) {
        self.groups.insert(name.to_string());
    }

    pub fn detach_group(&mut self, name: &str) {
        self.groups.remove(name);
    }
}
