//! Command lifecycle events.
//!
//! Every dispatched adapter call emits exactly one `Started` and one
//! `Finished` with the same id, success or failure. Consumers rebuild the
//! set of currently-running commands from these two message types alone.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommandEvent {
    Started {
        id: u64,
        description: String,
        /// Epoch milliseconds at dispatch.
        timestamp: i64,
    },
    Finished {
        id: u64,
    },
}

impl CommandEvent {
    pub fn id(&self) -> u64 {
        match self {
            CommandEvent::Started { id, .. } | CommandEvent::Finished { id } => *id,
        }
    }
}
