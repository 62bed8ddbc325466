//! Tool catalogue and result rendering.

use mailbridge_core::ToolOutput;
use mailbridge_core::tool::{
    ADD_EMAIL_CONFIG, DELETE_EMAIL_CONFIG, LIST_EMAIL_CONFIGS, READ_EMAIL, SEND_EMAIL,
    UPDATE_EMAIL_CONFIG,
};
use serde_json::{Map, Value, json};

/// Text returned when a mailbox has no messages.
pub const EMPTY_MAILBOX: &str = "No emails found.";

fn string_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn port_property(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 1, "maximum": 65535, "description": description })
}

fn name_property() -> Value {
    string_property("Name of the email configuration")
}

/// Properties shared by add and update, keyed by argument name.
fn profile_properties() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("name".into(), name_property());
    properties.insert("outbound_host".into(), string_property("SMTP server host"));
    properties.insert("outbound_port".into(), port_property("SMTP server port"));
    properties.insert("outbound_user".into(), string_property("SMTP user name"));
    properties.insert("outbound_password".into(), string_property("SMTP password"));
    properties.insert(
        "outbound_security".into(),
        json!({
            "type": "string",
            "enum": ["none", "starttls", "tls"],
            "description": "SMTP connection security"
        }),
    );
    properties.insert("inbound_host".into(), string_property("IMAP server host"));
    properties.insert(
        "inbound_port".into(),
        port_property("IMAP server port; defaults to 993 with TLS, 143 without"),
    );
    properties.insert("inbound_user".into(), string_property("IMAP user name"));
    properties.insert("inbound_password".into(), string_property("IMAP password"));
    properties.insert(
        "inbound_security".into(),
        json!({
            "type": "string",
            "enum": ["none", "tls"],
            "description": "IMAP connection security"
        }),
    );
    properties
}

/// As [`profile_properties`], except `inbound_port` may be null to go back
/// to the default port.
fn update_properties() -> Map<String, Value> {
    let mut properties = profile_properties();
    properties.insert(
        "inbound_port".into(),
        json!({
            "type": ["integer", "null"],
            "minimum": 1,
            "maximum": 65535,
            "description": "IMAP server port; null goes back to 993 with TLS, 143 without"
        }),
    );
    properties
}

fn tool(name: &str, description: &str, properties: Map<String, Value>, required: &[&str]) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required,
        }
    })
}

/// Definitions returned by `tools/list`.
pub fn catalogue() -> Vec<Value> {
    let mut send = Map::new();
    send.insert("name".into(), name_property());
    send.insert("subject".into(), string_property("Subject line"));
    send.insert("body".into(), string_property("Plain text body"));
    send.insert(
        "to".into(),
        string_property("Recipient addresses, comma separated"),
    );
    send.insert("cc".into(), string_property("Cc addresses, comma separated"));
    send.insert(
        "bcc".into(),
        string_property("Bcc addresses, comma separated"),
    );

    let mut by_name = Map::new();
    by_name.insert("name".into(), name_property());

    vec![
        tool(
            LIST_EMAIL_CONFIGS,
            "List the names of all stored email configurations.",
            Map::new(),
            &[],
        ),
        tool(
            ADD_EMAIL_CONFIG,
            "Store a new email configuration with SMTP and IMAP settings.",
            profile_properties(),
            &[
                "name",
                "outbound_host",
                "outbound_port",
                "outbound_user",
                "outbound_password",
                "outbound_security",
                "inbound_host",
                "inbound_user",
                "inbound_password",
                "inbound_security",
            ],
        ),
        tool(
            UPDATE_EMAIL_CONFIG,
            "Change fields of an existing email configuration. Omitted fields keep their value.",
            update_properties(),
            &["name"],
        ),
        tool(
            DELETE_EMAIL_CONFIG,
            "Delete an email configuration.",
            by_name.clone(),
            &["name"],
        ),
        tool(
            SEND_EMAIL,
            "Send a plain text email using a stored configuration.",
            send,
            &["name", "subject", "body", "to"],
        ),
        tool(
            READ_EMAIL,
            "Read the 5 most recent messages in the INBOX of a stored configuration.",
            by_name,
            &["name"],
        ),
    ]
}

fn text_content(text: impl Into<String>) -> Value {
    json!({ "type": "text", "text": text.into() })
}

/// Renders a dispatcher result as a `tools/call` result.
pub fn render(output: ToolOutput) -> Value {
    let is_error = output.is_failure();
    let content: Vec<Value> = match output {
        ToolOutput::Text(text) | ToolOutput::Failure(text) => vec![text_content(text)],
        ToolOutput::Names(names) => vec![text_content(Value::from(names).to_string())],
        ToolOutput::Messages(messages) if messages.is_empty() => vec![text_content(EMPTY_MAILBOX)],
        ToolOutput::Messages(messages) => messages.into_iter().map(text_content).collect(),
    };

    json!({ "content": content, "isError": is_error })
}
