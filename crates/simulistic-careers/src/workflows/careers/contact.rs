use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::gateways::{NotificationSender, NotifyError};
use super::pipeline::NotificationTemplate;

/// Message left through the site's contact form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("failed to send message: {0}")]
    Delivery(#[from] NotifyError),
}

impl ContactMessage {
    fn validate(&self) -> Result<(), ContactError> {
        if self.name.trim().is_empty() {
            return Err(ContactError::MissingField("name"));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ContactError::MissingField("email"));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err(ContactError::InvalidEmail(email.to_string())),
        }
        if self.message.trim().is_empty() {
            return Err(ContactError::MissingField("message"));
        }
        Ok(())
    }
}

/// Forwards contact messages to the notification sender. Unlike application notifications,
/// delivery failures are returned to the caller.
pub struct ContactRelay<N> {
    notifier: Arc<N>,
    template: NotificationTemplate,
}

impl<N> ContactRelay<N>
where
    N: NotificationSender + 'static,
{
    pub fn new(notifier: Arc<N>, template: NotificationTemplate) -> Self {
        Self { notifier, template }
    }

    pub async fn send(&self, message: ContactMessage) -> Result<(), ContactError> {
        message.validate()?;

        let mut params = BTreeMap::new();
        params.insert("to_email".to_string(), self.template.recipient.clone());
        params.insert("from_name".to_string(), message.name.trim().to_string());
        params.insert("from_email".to_string(), message.email.trim().to_string());
        params.insert("message".to_string(), message.message.trim().to_string());

        self.notifier
            .send(self.template.request(params))
            .await
            .map_err(|err| {
                warn!(error = %err, "contact message delivery failed");
                ContactError::Delivery(err)
            })?;

        info!("contact message relayed");
        Ok(())
    }
}
