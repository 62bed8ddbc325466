//! Profile validation.

use super::model::MailProfile;

/// Validation error for a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Profile name is empty.
    EmptyName,
    /// Outbound host is empty.
    EmptyOutboundHost,
    /// Outbound port is zero.
    InvalidOutboundPort,
    /// Outbound login is empty.
    EmptyOutboundUser,
    /// Outbound password is empty.
    EmptyOutboundPassword,
    /// Inbound host is empty.
    EmptyInboundHost,
    /// Inbound port is zero.
    InvalidInboundPort,
    /// Inbound login is empty.
    EmptyInboundUser,
    /// Inbound password is empty.
    EmptyInboundPassword,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyName => "Profile name is required",
            Self::EmptyOutboundHost => "Outbound server is required",
            Self::InvalidOutboundPort => "Outbound port must be 1-65535",
            Self::EmptyOutboundUser => "Outbound user is required",
            Self::EmptyOutboundPassword => "Outbound password is required",
            Self::EmptyInboundHost => "Inbound server is required",
            Self::InvalidInboundPort => "Inbound port must be 1-65535",
            Self::EmptyInboundUser => "Inbound user is required",
            Self::EmptyInboundPassword => "Inbound password is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyName => "name",
            Self::EmptyOutboundHost => "outbound_host",
            Self::InvalidOutboundPort => "outbound_port",
            Self::EmptyOutboundUser => "outbound_user",
            Self::EmptyOutboundPassword => "outbound_password",
            Self::EmptyInboundHost => "inbound_host",
            Self::InvalidInboundPort => "inbound_port",
            Self::EmptyInboundUser => "inbound_user",
            Self::EmptyInboundPassword => "inbound_password",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a profile.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a profile.
///
/// Returns `Ok(())` if valid, or every problem found.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_profile(profile: &MailProfile) -> ValidationResult {
    let mut errors = Vec::new();

    if profile.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    let out = &profile.outbound;
    if out.host.trim().is_empty() {
        errors.push(ValidationError::EmptyOutboundHost);
    }
    if out.port == 0 {
        errors.push(ValidationError::InvalidOutboundPort);
    }
    if out.user.trim().is_empty() {
        errors.push(ValidationError::EmptyOutboundUser);
    }
    if out.password.is_empty() {
        errors.push(ValidationError::EmptyOutboundPassword);
    }

    let inb = &profile.inbound;
    if inb.host.trim().is_empty() {
        errors.push(ValidationError::EmptyInboundHost);
    }
    if inb.port == Some(0) {
        errors.push(ValidationError::InvalidInboundPort);
    }
    if inb.user.trim().is_empty() {
        errors.push(ValidationError::EmptyInboundUser);
    }
    if inb.password.is_empty() {
        errors.push(ValidationError::EmptyInboundPassword);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::profile::sample_profile;

    #[test]
    fn test_valid_profile() {
        assert!(validate_profile(&sample_profile("work")).is_ok());
    }

    #[test]
    fn test_blank_name() {
        let profile = sample_profile("   ");
        let errors = validate_profile(&profile).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyName]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut profile = sample_profile("work");
        profile.outbound.host = String::new();
        profile.outbound.port = 0;
        profile.inbound.port = Some(0);
        profile.inbound.password = String::new();

        let errors = validate_profile(&profile).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyOutboundHost,
                ValidationError::InvalidOutboundPort,
                ValidationError::InvalidInboundPort,
                ValidationError::EmptyInboundPassword,
            ]
        );
        assert_eq!(errors[1].field(), "outbound_port");
    }

    #[test]
    fn test_missing_inbound_port_is_fine() {
        let mut profile = sample_profile("work");
        profile.inbound.port = None;
        assert!(validate_profile(&profile).is_ok());
    }
}
