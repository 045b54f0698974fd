use chrono::{DateTime, Utc};

use crate::error::RepositoryError;
use crate::ids::{ThreadId, UserId};
use crate::messages::{Message, MessageRepository, MessageThread};

use super::MemoryStore;

impl MessageRepository for MemoryStore {
    fn thread_for_pair(
        &self,
        agency_id: UserId,
        talent_id: UserId,
    ) -> Result<Option<MessageThread>, RepositoryError> {
        Ok(self
            .tables()?
            .threads
            .values()
            .find(|thread| thread.agency_id == agency_id && thread.talent_id == talent_id)
            .cloned())
    }

    fn insert_thread(&self, thread: MessageThread) -> Result<MessageThread, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.threads.values().any(|existing| {
            existing.agency_id == thread.agency_id && existing.talent_id == thread.talent_id
        }) {
            return Err(RepositoryError::Conflict("message thread"));
        }
        tables.threads.insert(thread.id, thread.clone());
        Ok(thread)
    }

    fn update_thread(&self, thread: MessageThread) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.threads.get_mut(&thread.id) {
            Some(slot) => {
                *slot = thread;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn thread(&self, id: ThreadId) -> Result<Option<MessageThread>, RepositoryError> {
        Ok(self.tables()?.threads.get(&id).cloned())
    }

    fn threads_for_user(&self, user_id: UserId) -> Result<Vec<MessageThread>, RepositoryError> {
        Ok(self
            .tables()?
            .threads
            .values()
            .filter(|thread| thread.has_participant(user_id))
            .cloned()
            .collect())
    }

    fn insert_message(&self, message: Message) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.threads.contains_key(&message.thread_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.messages.push(message);
        Ok(())
    }

    fn messages(&self, thread_id: ThreadId) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .tables()?
            .messages
            .iter()
            .filter(|message| message.thread_id == thread_id)
            .cloned()
            .collect())
    }

    fn mark_read(
        &self,
        thread_id: ThreadId,
        reader: UserId,
        at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut tables = self.tables()?;
        let mut marked = 0;
        for message in tables.messages.iter_mut().filter(|message| {
            message.thread_id == thread_id && message.sender_id != reader && message.read_at.is_none()
        }) {
            message.read_at = Some(at);
            marked += 1;
        }
        Ok(marked)
    }
}
