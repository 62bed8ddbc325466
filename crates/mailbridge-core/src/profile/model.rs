//! Mail profile model types.

use serde::{Deserialize, Deserializer, Serialize};

/// Connection security for the outbound (SMTP) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboundSecurity {
    /// Plain TCP, no encryption.
    None,
    /// Plain connect, upgraded with STARTTLS before authenticating.
    #[default]
    StartTls,
    /// Implicit TLS from the first byte.
    Tls,
}

impl OutboundSecurity {
    /// Parses a security mode, accepting the spellings agents commonly use.
    ///
    /// Matching is case-insensitive; `SSL/TLS` and `ssl` mean [`Self::Tls`].
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "plain" => Some(Self::None),
            "starttls" => Some(Self::StartTls),
            "tls" | "ssl" | "ssl/tls" => Some(Self::Tls),
            _ => None,
        }
    }

    /// Canonical stored form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StartTls => "starttls",
            Self::Tls => "tls",
        }
    }
}

impl<'de> Deserialize<'de> for OutboundSecurity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown outbound security '{value}' (expected none, starttls or tls)"
            ))
        })
    }
}

/// Connection security for the inbound (IMAP) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InboundSecurity {
    /// Plain TCP, no encryption.
    None,
    /// Implicit TLS from the first byte.
    #[default]
    Tls,
}

impl InboundSecurity {
    /// Parses a security mode; `SSL/TLS` and `ssl` mean [`Self::Tls`].
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "plain" => Some(Self::None),
            "tls" | "ssl" | "ssl/tls" => Some(Self::Tls),
            _ => None,
        }
    }

    /// Canonical stored form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Tls => "tls",
        }
    }

    /// Protocol default port for this mode.
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::None => 143,
            Self::Tls => 993,
        }
    }
}

/// Either a mode name or the boolean `imap_ssl` flag older callers send.
#[derive(Deserialize)]
#[serde(untagged)]
enum InboundSecurityArg {
    Name(String),
    Flag(bool),
}

impl<'de> Deserialize<'de> for InboundSecurity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match InboundSecurityArg::deserialize(deserializer)? {
            InboundSecurityArg::Flag(true) => Ok(Self::Tls),
            InboundSecurityArg::Flag(false) => Ok(Self::None),
            InboundSecurityArg::Name(value) => Self::parse(&value).ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "unknown inbound security '{value}' (expected none or tls)"
                ))
            }),
        }
    }
}

/// Outbound (SMTP submission) parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct OutboundConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login name, also used as the envelope sender.
    pub user: String,
    /// Password.
    pub password: String,
    /// Security mode.
    pub security: OutboundSecurity,
}

/// Inbound (IMAP) parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct InboundConfig {
    /// Server hostname.
    pub host: String,
    /// Server port; `None` means the default for [`Self::security`].
    pub port: Option<u16>,
    /// Login name.
    pub user: String,
    /// Password.
    pub password: String,
    /// Security mode.
    pub security: InboundSecurity,
}

impl InboundConfig {
    /// Port to connect to.
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.security.default_port())
    }
}

// Passwords stay out of Debug output so profiles can be logged safely.
impl std::fmt::Debug for OutboundConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("security", &self.security)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for InboundConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("security", &self.security)
            .finish_non_exhaustive()
    }
}

/// A named mail account: where to send from and where to read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailProfile {
    /// Unique name, immutable once stored.
    pub name: String,
    /// Outbound side.
    pub outbound: OutboundConfig,
    /// Inbound side.
    pub inbound: InboundConfig,
}

/// Fields to change on an existing profile; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New outbound host.
    pub outbound_host: Option<String>,
    /// New outbound port.
    pub outbound_port: Option<u16>,
    /// New outbound login.
    pub outbound_user: Option<String>,
    /// New outbound password.
    pub outbound_password: Option<String>,
    /// New outbound security.
    pub outbound_security: Option<OutboundSecurity>,
    /// New inbound host.
    pub inbound_host: Option<String>,
    /// New inbound port; `Some(None)` goes back to the protocol default.
    pub inbound_port: Option<Option<u16>>,
    /// New inbound login.
    pub inbound_user: Option<String>,
    /// New inbound password.
    pub inbound_password: Option<String>,
    /// New inbound security.
    pub inbound_security: Option<InboundSecurity>,
}

impl ProfileUpdate {
    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the supplied fields to `profile`.
    pub fn apply_to(self, profile: &mut MailProfile) {
        let out = &mut profile.outbound;
        if let Some(host) = self.outbound_host {
            out.host = host;
        }
        if let Some(port) = self.outbound_port {
            out.port = port;
        }
        if let Some(user) = self.outbound_user {
            out.user = user;
        }
        if let Some(password) = self.outbound_password {
            out.password = password;
        }
        if let Some(security) = self.outbound_security {
            out.security = security;
        }

        let inb = &mut profile.inbound;
        if let Some(host) = self.inbound_host {
            inb.host = host;
        }
        if let Some(port) = self.inbound_port {
            inb.port = port;
        }
        if let Some(user) = self.inbound_user {
            inb.user = user;
        }
        if let Some(password) = self.inbound_password {
            inb.password = password;
        }
        if let Some(security) = self.inbound_security {
            inb.security = security;
        }
    }
}
