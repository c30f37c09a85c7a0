// src/formatting.rs

use crate::core::Event;

/// A trait for rendering an event as the text body a medium sends.
pub trait EventFormatter: Send + Sync {
    fn format(&self, event: &Event) -> String;
}

/// Plain, single-line rendering used by SMS and chat-bot mediums.
pub struct PlainTextFormatter;

impl EventFormatter for PlainTextFormatter {
    fn format(&self, event: &Event) -> String {
        format!(
            "{} [{}] {}",
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.message
        )
    }
}

/// A formatter for Slack that uses mrkdwn emphasis for the event type.
pub struct SlackTextFormatter;

impl EventFormatter for SlackTextFormatter {
    fn format(&self, event: &Event) -> String {
        format!(
            "*{}* {} _{}_",
            escape_mrkdwn(&event.event_type),
            escape_mrkdwn(&event.message),
            event.timestamp.to_rfc3339()
        )
    }
}

/// Slack requires `&`, `<` and `>` to be entity-encoded in message text.
fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
