use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::{AuditEvent, AuditTrail};
use crate::auth::AuthUser;
use crate::clock::Clock;
use crate::error::{RepositoryError, ServiceError};
use crate::ids::{MessageId, ThreadId, UserId};
use crate::permissions::PermissionService;
use crate::users::{Role, UserRepository};

use super::domain::{Message, MessageThread, ThreadSummary, MAX_BODY_LEN, MAX_SUBJECT_LEN};
use super::repository::MessageRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub recipient_id: UserId,
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadView {
    pub thread: MessageThread,
    pub messages: Vec<Message>,
}

/// Messaging between an agency and a talent. Every send re-checks the
/// contact permission, so a revoke cuts the conversation in both directions.
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    permissions: Arc<PermissionService>,
    audit: AuditTrail,
    clock: Arc<dyn Clock>,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        permissions: Arc<PermissionService>,
        audit: AuditTrail,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            messages,
            users,
            permissions,
            audit,
            clock,
        }
    }

    /// Start or continue the conversation with `recipient_id`.
    pub fn send(&self, auth: &AuthUser, request: NewMessage) -> Result<Message, ServiceError> {
        let body = validate_body(&request.body)?;
        let subject = request
            .subject
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if subject
            .as_deref()
            .map(|text| text.chars().count())
            .unwrap_or(0)
            > MAX_SUBJECT_LEN
        {
            return Err(ServiceError::validation(format!(
                "subject must be at most {MAX_SUBJECT_LEN} characters"
            )));
        }

        let recipient = self
            .users
            .fetch(request.recipient_id)?
            .filter(|user| user.is_active())
            .ok_or(ServiceError::NotFound("recipient"))?;
        if recipient.role == auth.role {
            return Err(ServiceError::validation(
                "messages are exchanged between an agency and a talent",
            ));
        }

        let (agency_id, talent_id) = match auth.role {
            Role::Agency => (auth.id, recipient.id),
            Role::Talent => (recipient.id, auth.id),
        };
        self.ensure_granted(agency_id, talent_id)?;

        let now = self.clock.now();
        let thread = match self.messages.thread_for_pair(agency_id, talent_id)? {
            Some(thread) => thread,
            None => {
                let thread = MessageThread {
                    id: ThreadId::generate(),
                    agency_id,
                    talent_id,
                    subject,
                    created_at: now,
                    last_message_at: now,
                };
                match self.messages.insert_thread(thread) {
                    Ok(thread) => {
                        self.audit.record(
                            AuditEvent::new("message_thread.created", "message_thread", thread.id)
                                .actor(auth.id),
                        );
                        thread
                    }
                    // Lost a race with the counterpart; use their thread.
                    Err(RepositoryError::Conflict(_)) => self
                        .messages
                        .thread_for_pair(agency_id, talent_id)?
                        .ok_or(ServiceError::NotFound("message thread"))?,
                    Err(err) => return Err(err.into()),
                }
            }
        };

        self.append(auth, thread, body)
    }

    pub fn reply(
        &self,
        auth: &AuthUser,
        thread_id: ThreadId,
        request: ReplyRequest,
    ) -> Result<Message, ServiceError> {
        let body = validate_body(&request.body)?;
        let thread = self.participant_thread(auth, thread_id)?;
        self.ensure_granted(thread.agency_id, thread.talent_id)?;
        self.append(auth, thread, body)
    }

    /// Newest activity first.
    pub fn threads(&self, auth: &AuthUser) -> Result<Vec<ThreadSummary>, ServiceError> {
        let mut threads = self.messages.threads_for_user(auth.id)?;
        threads.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));

        threads
            .into_iter()
            .map(|thread| -> Result<ThreadSummary, ServiceError> {
                let messages = self.messages.messages(thread.id)?;
                let unread = messages
                    .iter()
                    .filter(|message| message.sender_id != auth.id && message.read_at.is_none())
                    .count();
                Ok(ThreadSummary {
                    counterpart_id: thread.counterpart(auth.id),
                    unread,
                    last_message: messages.last().cloned(),
                    thread,
                })
            })
            .collect()
    }

    pub fn messages(&self, auth: &AuthUser, thread_id: ThreadId) -> Result<ThreadView, ServiceError> {
        let thread = self.participant_thread(auth, thread_id)?;
        let messages = self.messages.messages(thread.id)?;
        Ok(ThreadView { thread, messages })
    }

    /// Marks the counterpart's messages as read. Returns how many changed.
    pub fn mark_read(&self, auth: &AuthUser, thread_id: ThreadId) -> Result<usize, ServiceError> {
        let thread = self.participant_thread(auth, thread_id)?;
        Ok(self
            .messages
            .mark_read(thread.id, auth.id, self.clock.now())?)
    }

    fn append(
        &self,
        auth: &AuthUser,
        mut thread: MessageThread,
        body: String,
    ) -> Result<Message, ServiceError> {
        let now = self.clock.now();
        let message = Message {
            id: MessageId::generate(),
            thread_id: thread.id,
            sender_id: auth.id,
            body,
            sent_at: now,
            read_at: None,
        };
        self.messages.insert_message(message.clone())?;

        thread.last_message_at = now;
        self.messages.update_thread(thread.clone())?;

        info!(thread_id = %thread.id, sender_id = %auth.id, "message sent");
        self.audit.record(
            AuditEvent::new("message.sent", "message_thread", thread.id)
                .actor(auth.id)
                .detail("message_id", message.id),
        );
        Ok(message)
    }

    fn participant_thread(
        &self,
        auth: &AuthUser,
        thread_id: ThreadId,
    ) -> Result<MessageThread, ServiceError> {
        let thread = self
            .messages
            .thread(thread_id)?
            .ok_or(ServiceError::NotFound("message thread"))?;
        if !thread.has_participant(auth.id) {
            return Err(ServiceError::forbidden(
                "only participants can access this thread",
            ));
        }
        Ok(thread)
    }

    fn ensure_granted(&self, agency_id: UserId, talent_id: UserId) -> Result<(), ServiceError> {
        if self.permissions.is_granted(agency_id, talent_id)? {
            Ok(())
        } else {
            warn!(agency_id = %agency_id, talent_id = %talent_id, "message refused without contact permission");
            Err(ServiceError::forbidden(
                "a granted contact permission is required to message",
            ))
        }
    }
}

fn validate_body(raw: &str) -> Result<String, ServiceError> {
    let body = raw.trim();
    if body.is_empty() {
        return Err(ServiceError::validation("message body is required"));
    }
    if body.chars().count() > MAX_BODY_LEN {
        return Err(ServiceError::validation(format!(
            "message body must be at most {MAX_BODY_LEN} characters"
        )));
    }
    Ok(body.to_string())
}
