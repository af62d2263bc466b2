//! Events: `load`, `message [containing "text"]` and `command /name`.

use trellis_foundation::{Event, Value};
use trellis_parser::{Diagnostic, EventGuard, RegistryBuilder, RegistryError};

/// Fires for every occurrence.
#[derive(Debug)]
pub struct AnyOccurrence;

impl EventGuard for AnyOccurrence {}

/// Fires for messages that contain a fragment, ignoring case.
#[derive(Debug)]
pub struct MessageFilter {
    needle: Option<String>,
}

impl EventGuard for MessageFilter {
    fn check(&self, event: &Event) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };
        event
            .payload()
            .and_then(Value::as_str)
            .is_some_and(|text| text.to_lowercase().contains(needle))
    }
}

/// Fires for commands whose first word is the given name.
#[derive(Debug)]
pub struct CommandFilter {
    name: String,
}

impl EventGuard for CommandFilter {
    fn check(&self, event: &Event) -> bool {
        let Some(text) = event.payload().and_then(Value::as_str) else {
            return false;
        };
        let word = text.split_whitespace().next().unwrap_or_default();
        word.trim_start_matches('/').eq_ignore_ascii_case(&self.name)
    }
}

pub(crate) fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder.register_event("load", &["[script] load[ing]"], |_| Ok(Box::new(AnyOccurrence)))?;

    builder.register_event("message", &["message [containing %-*string%]"], |mut args| {
        let needle = match args.take(0) {
            None => None,
            Some(expr) => {
                let text = expr
                    .literal_values()
                    .and_then(|values| values.first())
                    .and_then(Value::as_str)
                    .ok_or_else(|| Diagnostic::semantic("a message filter must be plain text"))?;
                Some(text.to_lowercase())
            }
        };
        Ok(Box::new(MessageFilter { needle }))
    })?;

    builder.register_event("command", &["command [/]<[a-zA-Z][a-zA-Z0-9_-]*>"], |args| {
        let name = args
            .regex(0)
            .map(|m| m.text().to_string())
            .ok_or_else(|| Diagnostic::semantic("a command needs a name"))?;
        Ok(Box::new(CommandFilter { name }))
    })?;
    Ok(())
}
