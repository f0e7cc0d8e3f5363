use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing state reported through `QueueManager::update_monitor`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageState {
    #[default]
    Pending,
    InProgress,
    Processed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub destination: String,
    pub body: serde_json::Value,
    pub state: MessageState,
    pub session_id: Option<String>,
}

impl Message {
    pub fn new(destination: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            destination: destination.into(),
            body,
            state: MessageState::Pending,
            session_id: None,
        }
    }
    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }
    pub fn with_state(mut self, state: MessageState) -> Self {
        self.state = state;
        self
    }
}
