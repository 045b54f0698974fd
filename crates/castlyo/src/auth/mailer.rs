use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Transactional email handed to the delivery provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub to: String,
    pub template: String,
    pub subject: String,
    pub variables: BTreeMap<String, String>,
}

/// Outbound email hook (SMTP relay, provider API, or a test outbox).
pub trait Mailer: Send + Sync {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Keeps every message in memory; used by tests and the demo.
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        match self.outbox.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Most recent value of `variable` mailed to `to`.
    pub fn last_variable(&self, to: &str, variable: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|email| email.to == to)
            .and_then(|email| email.variables.get(variable).cloned())
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let mut guard = self
            .outbox
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".to_string()))?;
        guard.push(email);
        Ok(())
    }
}
