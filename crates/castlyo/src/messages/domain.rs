use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, ThreadId, UserId};

pub const MAX_BODY_LEN: usize = 5_000;
pub const MAX_SUBJECT_LEN: usize = 200;

/// Row of `message_threads`; one per (agency, talent) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageThread {
    pub id: ThreadId,
    pub agency_id: UserId,
    pub talent_id: UserId,
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl MessageThread {
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.agency_id == user_id || self.talent_id == user_id
    }

    pub fn counterpart(&self, user_id: UserId) -> UserId {
        if self.agency_id == user_id {
            self.talent_id
        } else {
            self.agency_id
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub sender_id: UserId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    #[serde(flatten)]
    pub thread: MessageThread,
    pub counterpart_id: UserId,
    pub unread: usize,
    pub last_message: Option<Message>,
}
