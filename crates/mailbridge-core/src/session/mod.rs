//! Per-call mail sessions.
//!
//! A session opens a connection for one operation and closes it before
//! returning. The traits are the seam the [`crate::Dispatcher`] talks to;
//! [`SmtpOutbound`] and [`ImapInbound`] are the network implementations.

mod inbound;
mod outbound;

pub use inbound::{ImapConnector, ImapInbound, latest_ids};
pub use outbound::{SmtpConnector, SmtpOutbound};

use crate::error::{FetchFailure, SendFailure};
use crate::profile::{InboundConfig, OutboundConfig};

/// Number of messages `read_email` returns.
pub const DEFAULT_FETCH_COUNT: usize = 5;

/// Hands one message to the outbound server of a profile.
#[allow(async_fn_in_trait)]
pub trait OutboundSession {
    /// Connects, authenticates, submits `message` and disconnects.
    ///
    /// # Errors
    ///
    /// Returns a [`SendFailure`] describing the first step that failed.
    async fn send(
        &self,
        config: &OutboundConfig,
        message: &OutgoingMessage,
    ) -> Result<(), SendFailure>;
}

/// Reads the newest messages from the inbound server of a profile.
#[allow(async_fn_in_trait)]
pub trait InboundSession {
    /// Returns up to `count` raw messages, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchFailure`]; messages read before the failure are
    /// discarded.
    async fn fetch_latest(
        &self,
        config: &InboundConfig,
        count: usize,
    ) -> Result<Vec<String>, FetchFailure>;
}

/// Connects over the network; the default connector for both sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

/// A flat subject + body message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients; listed in a `Cc:` header.
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients; envelope only.
    pub bcc: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl OutgoingMessage {
    /// Create a message to a single recipient.
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Add a carbon-copy recipient.
    #[must_use]
    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Add a blind carbon-copy recipient.
    #[must_use]
    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Every envelope recipient: to, then cc, then bcc.
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(String::as_str)
    }

    /// Renders the header block and body.
    ///
    /// Line breaks in the subject are folded to spaces so it cannot add
    /// headers of its own.
    #[must_use]
    pub fn to_rfc822(&self) -> String {
        let subject: String = self
            .subject
            .chars()
            .map(|c| if matches!(c, '\r' | '\n') { ' ' } else { c })
            .collect();

        let mut out = format!("Subject: {subject}\r\n");
        if !self.cc.is_empty() {
            out.push_str("Cc: ");
            out.push_str(&self.cc.join(", "));
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        out
    }
}

/// Splits a comma-separated address list, dropping blanks.
#[must_use]
pub fn split_addresses(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_message() {
        let message = OutgoingMessage::new("a@example.com", "Hello", "Line one\nLine two");
        assert_eq!(
            message.to_rfc822(),
            "Subject: Hello\r\n\r\nLine one\nLine two"
        );
    }

    #[test]
    fn test_cc_header_and_bcc_envelope() {
        let message = OutgoingMessage::new("a@example.com", "Hi", "Body")
            .cc("b@example.com")
            .cc("c@example.com")
            .bcc("hidden@example.com");

        let rendered = message.to_rfc822();
        assert_eq!(
            rendered,
            "Subject: Hi\r\nCc: b@example.com, c@example.com\r\n\r\nBody"
        );
        assert!(!rendered.contains("hidden"));
        assert_eq!(
            message.recipients().collect::<Vec<_>>(),
            vec![
                "a@example.com",
                "b@example.com",
                "c@example.com",
                "hidden@example.com"
            ]
        );
    }

    #[test]
    fn test_subject_cannot_inject_headers() {
        let message = OutgoingMessage::new("a@example.com", "Hi\r\nBcc: evil@example.com", "x");
        assert_eq!(
            message.to_rfc822(),
            "Subject: Hi  Bcc: evil@example.com\r\n\r\nx"
        );
    }

    #[test]
    fn test_split_addresses() {
        assert_eq!(
            split_addresses(" a@x.com, ,b@y.org "),
            vec!["a@x.com".to_string(), "b@y.org".to_string()]
        );
        assert!(split_addresses("").is_empty());
    }
}
