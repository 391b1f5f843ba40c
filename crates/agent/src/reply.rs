use serde::{Deserialize, Serialize};

/// Text a handler produced for the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    pub output: String,
}

impl AgentReply {
    pub fn new(output: impl Into<String>) -> Self {
        Self { output: output.into() }
    }
}
