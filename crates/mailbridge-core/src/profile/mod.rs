//! Mail profiles and their storage.

mod model;
mod store;
mod validation;

pub use model::{
    InboundConfig, InboundSecurity, MailProfile, OutboundConfig, OutboundSecurity, ProfileUpdate,
};
pub use store::ProfileStore;
pub use validation::{ValidationError, ValidationResult, validate_profile};

#[cfg(test)]
pub(crate) fn sample_profile(name: &str) -> MailProfile {
    MailProfile {
        name: name.to_string(),
        outbound: OutboundConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "me@example.com".to_string(),
            password: "out-secret".to_string(),
            security: OutboundSecurity::StartTls,
        },
        inbound: InboundConfig {
            host: "imap.example.com".to_string(),
            port: None,
            user: "me@example.com".to_string(),
            password: "in-secret".to_string(),
            security: InboundSecurity::Tls,
        },
    }
}
