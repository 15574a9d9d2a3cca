//! Email configuration (Resend)

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key (re_...); notifications are skipped when unset
    #[serde(default)]
    pub resend_api_key: String,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Recipient for new-donation alerts
    pub admin_email: Option<String>,
}

impl EmailConfig {
    /// API key as a secret, `None` when unset.
    pub fn api_key(&self) -> Option<SecretString> {
        (!self.resend_api_key.is_empty())
            .then(|| SecretString::new(self.resend_api_key.clone()))
    }

    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.resend_api_key.is_empty() && !self.resend_api_key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if let Some(admin) = &self.admin_email {
            if !admin.contains('@') {
                return Err(ValidationError::InvalidAdminEmail);
            }
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            admin_email: None,
        }
    }
}

fn default_from_email() -> String {
    "donations@temple.org".to_string()
}

fn default_from_name() -> String {
    "Temple Seva".to_string()
}
