use castlyo::auth::{MailError, Mailer, OutboundEmail};
use castlyo::config::AppEnvironment;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Delivers mail into the log. Outside production the template variables
/// (verification tokens included) are written out so accounts can be
/// confirmed; in production only their names are.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TracingMailer {
    reveal_variables: bool,
}

impl TracingMailer {
    pub(crate) fn for_environment(environment: AppEnvironment) -> Self {
        Self {
            reveal_variables: environment != AppEnvironment::Production,
        }
    }

    pub(crate) fn reveals_variables(&self) -> bool {
        self.reveal_variables
    }

    pub(crate) fn render_variables(&self, email: &OutboundEmail) -> String {
        email
            .variables
            .iter()
            .map(|(name, value)| {
                if self.reveal_variables {
                    format!("{name}={value}")
                } else {
                    name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Mailer for TracingMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        info!(
            to = %email.to,
            template = %email.template,
            subject = %email.subject,
            variables = %self.render_variables(&email),
            "outbound email delivered to log"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn verification_email() -> OutboundEmail {
        let mut variables = BTreeMap::new();
        variables.insert("display_name".to_string(), "Ana".to_string());
        variables.insert("token".to_string(), "f3a9c0".to_string());
        OutboundEmail {
            to: "ana@example.test".to_string(),
            template: "verify_email".to_string(),
            subject: "Confirm".to_string(),
            variables,
        }
    }

    #[test]
    fn development_mail_carries_the_verification_token() {
        let mailer = TracingMailer::for_environment(AppEnvironment::Development);
        assert!(mailer.reveals_variables());
        let rendered = mailer.render_variables(&verification_email());
        assert_eq!(rendered, "display_name=Ana, token=f3a9c0");
        assert!(mailer.send(verification_email()).is_ok());
    }

    #[test]
    fn production_mail_logs_variable_names_only() {
        let mailer = TracingMailer::for_environment(AppEnvironment::Production);
        let rendered = mailer.render_variables(&verification_email());
        assert_eq!(rendered, "display_name, token");
        assert!(!rendered.contains("f3a9c0"));
    }
}
