//! Decoding of tool invocations.
//!
//! Argument names follow the profile fields (`outbound_host`, ...). The
//! `smtp_*`/`imap_*` spellings are accepted as aliases.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::profile::{
    InboundConfig, InboundSecurity, MailProfile, OutboundConfig, OutboundSecurity, ProfileUpdate,
};
use crate::session::{OutgoingMessage, split_addresses};

/// Tool that lists profile names.
pub const LIST_EMAIL_CONFIGS: &str = "list_email_configs";
/// Tool that stores a new profile.
pub const ADD_EMAIL_CONFIG: &str = "add_email_config";
/// Tool that changes fields of a profile.
pub const UPDATE_EMAIL_CONFIG: &str = "update_email_config";
/// Tool that removes a profile.
pub const DELETE_EMAIL_CONFIG: &str = "delete_email_config";
/// Tool that sends a message.
pub const SEND_EMAIL: &str = "send_email";
/// Tool that reads the newest messages.
pub const READ_EMAIL: &str = "read_email";

/// Every tool name, in catalogue order.
pub const TOOL_NAMES: [&str; 6] = [
    LIST_EMAIL_CONFIGS,
    ADD_EMAIL_CONFIG,
    UPDATE_EMAIL_CONFIG,
    DELETE_EMAIL_CONFIG,
    SEND_EMAIL,
    READ_EMAIL,
];

/// Errors decoding a tool invocation.
#[derive(Debug, Error)]
pub enum ToolCallError {
    /// No tool has this name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The arguments do not match the tool's schema.
    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        /// Tool that was called.
        tool: String,
        /// What serde rejected.
        source: serde_json::Error,
    },
}

/// A decoded tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    /// `list_email_configs`
    ListConfigs,
    /// `add_email_config`
    AddConfig(MailProfile),
    /// `update_email_config`
    UpdateConfig {
        /// Profile to change.
        name: String,
        /// Fields to change.
        update: ProfileUpdate,
    },
    /// `delete_email_config`
    DeleteConfig {
        /// Profile to remove.
        name: String,
    },
    /// `send_email`
    SendEmail {
        /// Profile to send from.
        name: String,
        /// Message to send.
        message: OutgoingMessage,
    },
    /// `read_email`
    ReadEmail {
        /// Profile to read from.
        name: String,
    },
}

impl ToolCall {
    /// Decodes a call from its tool name and JSON argument object.
    ///
    /// Missing (`null`) arguments are treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCallError::UnknownTool`] for an unrecognised name and
    /// [`ToolCallError::InvalidArguments`] if the arguments do not decode.
    pub fn parse(name: &str, arguments: Value) -> Result<Self, ToolCallError> {
        let arguments = if arguments.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            arguments
        };
        let invalid = |source| ToolCallError::InvalidArguments {
            tool: name.to_string(),
            source,
        };

        match name {
            LIST_EMAIL_CONFIGS => Ok(Self::ListConfigs),
            ADD_EMAIL_CONFIG => serde_json::from_value::<AddArgs>(arguments)
                .map(|args| Self::AddConfig(args.into()))
                .map_err(invalid),
            UPDATE_EMAIL_CONFIG => serde_json::from_value::<UpdateArgs>(arguments)
                .map(|args| {
                    let (name, update) = args.into_parts();
                    Self::UpdateConfig { name, update }
                })
                .map_err(invalid),
            DELETE_EMAIL_CONFIG => serde_json::from_value::<NameArgs>(arguments)
                .map(|args| Self::DeleteConfig { name: args.name })
                .map_err(invalid),
            SEND_EMAIL => serde_json::from_value::<SendArgs>(arguments)
                .map(|args| Self::SendEmail {
                    name: args.name,
                    message: OutgoingMessage {
                        to: split_addresses(&args.to),
                        cc: args.cc.as_deref().map(split_addresses).unwrap_or_default(),
                        bcc: args.bcc.as_deref().map(split_addresses).unwrap_or_default(),
                        subject: args.subject,
                        body: args.body,
                    },
                })
                .map_err(invalid),
            READ_EMAIL => serde_json::from_value::<NameArgs>(arguments)
                .map(|args| Self::ReadEmail { name: args.name })
                .map_err(invalid),
            other => Err(ToolCallError::UnknownTool(other.to_string())),
        }
    }

    /// Tool name of this call.
    #[must_use]
    pub const fn tool_name(&self) -> &'static str {
        match self {
            Self::ListConfigs => LIST_EMAIL_CONFIGS,
            Self::AddConfig(_) => ADD_EMAIL_CONFIG,
            Self::UpdateConfig { .. } => UPDATE_EMAIL_CONFIG,
            Self::DeleteConfig { .. } => DELETE_EMAIL_CONFIG,
            Self::SendEmail { .. } => SEND_EMAIL,
            Self::ReadEmail { .. } => READ_EMAIL,
        }
    }
}

#[derive(Deserialize)]
struct NameArgs {
    name: String,
}

#[derive(Deserialize)]
struct AddArgs {
    name: String,
    #[serde(alias = "smtp_server")]
    outbound_host: String,
    #[serde(alias = "smtp_port", deserialize_with = "port")]
    outbound_port: u16,
    #[serde(alias = "smtp_email")]
    outbound_user: String,
    #[serde(alias = "smtp_password")]
    outbound_password: String,
    #[serde(alias = "smtp_ssl")]
    outbound_security: OutboundSecurity,
    #[serde(alias = "imap_server")]
    inbound_host: String,
    #[serde(alias = "imap_port", default, deserialize_with = "optional_port")]
    inbound_port: Option<u16>,
    #[serde(alias = "imap_email")]
    inbound_user: String,
    #[serde(alias = "imap_password")]
    inbound_password: String,
    #[serde(alias = "imap_ssl")]
    inbound_security: InboundSecurity,
}

impl From<AddArgs> for MailProfile {
    fn from(args: AddArgs) -> Self {
        Self {
            name: args.name,
            outbound: OutboundConfig {
                host: args.outbound_host,
                port: args.outbound_port,
                user: args.outbound_user,
                password: args.outbound_password,
                security: args.outbound_security,
            },
            inbound: InboundConfig {
                host: args.inbound_host,
                port: args.inbound_port,
                user: args.inbound_user,
                password: args.inbound_password,
                security: args.inbound_security,
            },
        }
    }
}

/// `name` plus a `ProfileUpdate` with the argument aliases.
#[derive(Deserialize)]
struct UpdateArgs {
    name: String,
    #[serde(alias = "smtp_server", default)]
    outbound_host: Option<String>,
    #[serde(alias = "smtp_port", default, deserialize_with = "optional_port")]
    outbound_port: Option<u16>,
    #[serde(alias = "smtp_email", default)]
    outbound_user: Option<String>,
    #[serde(alias = "smtp_password", default)]
    outbound_password: Option<String>,
    #[serde(alias = "smtp_ssl", default)]
    outbound_security: Option<OutboundSecurity>,
    #[serde(alias = "imap_server", default)]
    inbound_host: Option<String>,
    #[serde(alias = "imap_port", default, deserialize_with = "port_change")]
    inbound_port: Option<Option<u16>>,
    #[serde(alias = "imap_email", default)]
    inbound_user: Option<String>,
    #[serde(alias = "imap_password", default)]
    inbound_password: Option<String>,
    #[serde(alias = "imap_ssl", default)]
    inbound_security: Option<InboundSecurity>,
}

impl UpdateArgs {
    fn into_parts(self) -> (String, ProfileUpdate) {
        let update = ProfileUpdate {
            outbound_host: self.outbound_host,
            outbound_port: self.outbound_port,
            outbound_user: self.outbound_user,
            outbound_password: self.outbound_password,
            outbound_security: self.outbound_security,
            inbound_host: self.inbound_host,
            inbound_port: self.inbound_port,
            inbound_user: self.inbound_user,
            inbound_password: self.inbound_password,
            inbound_security: self.inbound_security,
        };
        (self.name, update)
    }
}

#[derive(Deserialize)]
struct SendArgs {
    name: String,
    subject: String,
    body: String,
    to: String,
    #[serde(default)]
    cc: Option<String>,
    #[serde(default)]
    bcc: Option<String>,
}

/// A port given as a JSON number or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum PortArg {
    Number(u64),
    Text(String),
}

impl PortArg {
    fn into_port<E: serde::de::Error>(self) -> Result<u16, E> {
        let parsed = match &self {
            Self::Number(n) => u16::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse().ok(),
        };
        parsed.ok_or_else(|| {
            let shown = match self {
                Self::Number(n) => n.to_string(),
                Self::Text(s) => s,
            };
            E::custom(format!("invalid port '{shown}' (expected 1-65535)"))
        })
    }
}

fn port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    PortArg::deserialize(deserializer)?.into_port()
}

fn optional_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    Option::<PortArg>::deserialize(deserializer)?
        .map(PortArg::into_port)
        .transpose()
}

/// Only called for a present field, so `null` means "reset" and absence
/// falls back to `default` ("keep").
fn port_change<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<u16>>, D::Error> {
    optional_port(deserializer).map(Some)
}
