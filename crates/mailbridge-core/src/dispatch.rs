//! Tool dispatcher.
//!
//! Maps each tool onto the store and sessions and folds every outcome into
//! a [`ToolOutput`]. Only an invocation that names no tool, or that cannot be
//! decoded, comes back as `Err`; the cause of any other failure goes to the
//! [`Reporter`].

use crate::error::StoreError;
use crate::profile::{MailProfile, ProfileStore, ProfileUpdate};
use crate::report::{Reporter, TracingReporter};
use crate::session::{DEFAULT_FETCH_COUNT, InboundSession, OutboundSession, OutgoingMessage};
use crate::tool::{ADD_EMAIL_CONFIG, ToolCall, ToolCallError, UPDATE_EMAIL_CONFIG};
use serde_json::Value;
use tracing::debug;

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// Confirmation message.
    Text(String),
    /// Failure message for the caller.
    Failure(String),
    /// Profile names.
    Names(Vec<String>),
    /// Raw message texts, oldest first.
    Messages(Vec<String>),
}

impl ToolOutput {
    /// Returns true for [`ToolOutput::Failure`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The message of a `Text` or `Failure` output.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Failure(text) => Some(text),
            Self::Names(_) | Self::Messages(_) => None,
        }
    }
}

fn not_found(name: &str) -> ToolOutput {
    ToolOutput::Failure(format!("Email configuration '{name}' not found."))
}

fn add_failed() -> ToolOutput {
    ToolOutput::Failure("Can't add email configuration.".to_string())
}

fn update_failed(name: &str) -> ToolOutput {
    ToolOutput::Failure(format!("Can't update email '{name}' configuration."))
}

/// Runs tool calls against a [`ProfileStore`] and a pair of sessions.
pub struct Dispatcher<O, I, R = TracingReporter> {
    store: ProfileStore,
    outbound: O,
    inbound: I,
    reporter: R,
}

impl<O, I> Dispatcher<O, I>
where
    O: OutboundSession,
    I: InboundSession,
{
    /// Create a dispatcher that reports through `tracing`.
    pub const fn new(store: ProfileStore, outbound: O, inbound: I) -> Self {
        Self::with_reporter(store, outbound, inbound, TracingReporter)
    }
}

impl<O, I, R> Dispatcher<O, I, R>
where
    O: OutboundSession,
    I: InboundSession,
    R: Reporter,
{
    /// Create a dispatcher with a custom reporter.
    pub const fn with_reporter(store: ProfileStore, outbound: O, inbound: I, reporter: R) -> Self {
        Self {
            store,
            outbound,
            inbound,
            reporter,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Decodes and runs one tool invocation.
    ///
    /// Arguments that do not make a profile (or a change to one) fail the
    /// add and update tools the same way a rejected profile does; the cause
    /// goes to the reporter.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCallError::UnknownTool`] for an unrecognised tool, and
    /// [`ToolCallError::InvalidArguments`] for the other tools, or for an
    /// update without a readable `name`.
    pub async fn call(&self, tool: &str, arguments: Value) -> Result<ToolOutput, ToolCallError> {
        let name = arguments
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        match ToolCall::parse(tool, arguments) {
            Ok(call) => Ok(self.dispatch(call).await),
            Err(err @ ToolCallError::InvalidArguments { .. }) => match (tool, name) {
                (ADD_EMAIL_CONFIG, name) => {
                    self.reporter
                        .failure("add_config", name.as_deref().unwrap_or_default(), &err);
                    Ok(add_failed())
                }
                (UPDATE_EMAIL_CONFIG, Some(name)) => {
                    self.reporter.failure("update_config", &name, &err);
                    Ok(update_failed(&name))
                }
                _ => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Runs one decoded tool call.
    pub async fn dispatch(&self, call: ToolCall) -> ToolOutput {
        debug!(tool = call.tool_name(), "dispatching");
        match call {
            ToolCall::ListConfigs => self.list_configs().await,
            ToolCall::AddConfig(profile) => self.add_config(profile).await,
            ToolCall::UpdateConfig { name, update } => self.update_config(&name, update).await,
            ToolCall::DeleteConfig { name } => self.delete_config(&name).await,
            ToolCall::SendEmail { name, message } => self.send_email(&name, &message).await,
            ToolCall::ReadEmail { name } => self.read_latest_emails(&name).await,
        }
    }

    /// Names of every stored profile; empty if the store cannot be read.
    pub async fn list_configs(&self) -> ToolOutput {
        match self.store.load_all().await {
            Ok(profiles) => ToolOutput::Names(profiles.into_iter().map(|p| p.name).collect()),
            Err(err) => {
                self.reporter.failure("list_configs", "*", &err);
                ToolOutput::Names(Vec::new())
            }
        }
    }

    /// Stores a new profile.
    pub async fn add_config(&self, profile: MailProfile) -> ToolOutput {
        let requested = profile.name.clone();
        match self.store.add(profile).await {
            Ok(stored) => {
                self.reporter.success("add_config", &stored.name);
                ToolOutput::Text(format!(
                    "Email configuration '{}' added successfully.",
                    stored.name
                ))
            }
            Err(err) => {
                self.reporter.failure("add_config", &requested, &err);
                add_failed()
            }
        }
    }

    /// Changes the supplied fields of a profile.
    pub async fn update_config(&self, name: &str, update: ProfileUpdate) -> ToolOutput {
        match self.store.update(name, update).await {
            Ok(_) => {
                self.reporter.success("update_config", name);
                ToolOutput::Text(format!("Email configuration '{name}' updated successfully."))
            }
            Err(err) => {
                self.reporter.failure("update_config", name, &err);
                update_failed(name)
            }
        }
    }

    /// Removes a profile.
    pub async fn delete_config(&self, name: &str) -> ToolOutput {
        match self.store.delete(name).await {
            Ok(()) => {
                self.reporter.success("delete_config", name);
                ToolOutput::Text(format!("Email configuration '{name}' deleted successfully."))
            }
            Err(err) => {
                self.reporter.failure("delete_config", name, &err);
                match err {
                    StoreError::NotFound(_) => not_found(name),
                    _ => ToolOutput::Failure(format!("Can't delete email '{name}' configuration.")),
                }
            }
        }
    }

    /// Sends `message` from the named profile.
    ///
    /// An unknown profile is reported without touching the network.
    pub async fn send_email(&self, name: &str, message: &OutgoingMessage) -> ToolOutput {
        let profile = match self.store.load_one(name).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return not_found(name),
            Err(err) => {
                self.reporter.failure("send_email", name, &err);
                return ToolOutput::Failure(format!("Failed to send email: {err}"));
            }
        };

        match self.outbound.send(&profile.outbound, message).await {
            Ok(()) => {
                self.reporter.success("send_email", name);
                ToolOutput::Text("Email sent successfully.".to_string())
            }
            Err(err) => {
                self.reporter.failure("send_email", name, &err);
                ToolOutput::Failure(format!("Failed to send email: {err}"))
            }
        }
    }

    /// Reads the newest messages of the named profile.
    pub async fn read_latest_emails(&self, name: &str) -> ToolOutput {
        let profile = match self.store.load_one(name).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return not_found(name),
            Err(err) => {
                self.reporter.failure("read_latest_emails", name, &err);
                return ToolOutput::Failure(format!("Failed to load emails: {err}"));
            }
        };

        match self
            .inbound
            .fetch_latest(&profile.inbound, DEFAULT_FETCH_COUNT)
            .await
        {
            Ok(messages) => {
                self.reporter.success("read_latest_emails", name);
                ToolOutput::Messages(messages)
            }
            Err(err) => {
                self.reporter.failure("read_latest_emails", name, &err);
                ToolOutput::Failure(format!("Failed to load emails: {err}"))
            }
        }
    }
}
