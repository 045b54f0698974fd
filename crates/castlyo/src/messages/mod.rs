//! Agency and talent conversations, gated by a granted contact permission.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{Message, MessageThread, ThreadSummary};
pub use repository::MessageRepository;
pub use router::messages_router;
pub use service::{MessageService, NewMessage, ReplyRequest, ThreadView};
