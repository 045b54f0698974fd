use chrono::{DateTime, Utc};

use crate::error::RepositoryError;
use crate::ids::{ThreadId, UserId};

use super::domain::{Message, MessageThread};

pub trait MessageRepository: Send + Sync {
    fn thread_for_pair(
        &self,
        agency_id: UserId,
        talent_id: UserId,
    ) -> Result<Option<MessageThread>, RepositoryError>;
    /// Fails with `Conflict("message thread")` when the pair already has one.
    fn insert_thread(&self, thread: MessageThread) -> Result<MessageThread, RepositoryError>;
    fn update_thread(&self, thread: MessageThread) -> Result<(), RepositoryError>;
    fn thread(&self, id: ThreadId) -> Result<Option<MessageThread>, RepositoryError>;
    fn threads_for_user(&self, user_id: UserId) -> Result<Vec<MessageThread>, RepositoryError>;
    fn insert_message(&self, message: Message) -> Result<(), RepositoryError>;
    /// Oldest first.
    fn messages(&self, thread_id: ThreadId) -> Result<Vec<Message>, RepositoryError>;
    /// Marks messages not sent by `reader` as read; returns how many changed.
    fn mark_read(
        &self,
        thread_id: ThreadId,
        reader: UserId,
        at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;
}
