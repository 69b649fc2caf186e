//! Translates prop names into host attributes and event listeners.
//!
//! - `on<Event>` (prefix matched case-insensitively) registers a listener for `<event>`, with only the first character lower-cased.
//! - `className` (in any casing) is set as the `class` attribute.
//! - Anything else is set as an attribute of the same name.

use crate::{error::HostError, host::Host, node::Prop};
use tracing::warn;

/// The event name a prop name binds to, if it's an `on…` prop.
#[must_use]
pub fn event_name(prop_name: &str) -> Option<String> {
	let prefix = prop_name.get(..2)?;
	let rest = &prop_name[2..];
	if !prefix.eq_ignore_ascii_case("on") || rest.is_empty() {
		return None;
	}

	let mut chars = rest.chars();
	let first = chars.next()?;
	Some(first.to_lowercase().chain(chars).collect())
}

#[must_use]
pub fn attribute_name(prop_name: &str) -> &str {
	if prop_name.eq_ignore_ascii_case("classname") {
		"class"
	} else {
		prop_name
	}
}

pub(crate) fn bind_prop<H: Host>(host: &mut H, element: &H::Node, name: &str, value: &Prop) -> Result<(), HostError> {
	match (event_name(name), value) {
		(Some(event), Prop::Listener(listener)) => host.add_event_listener(element, &event, listener.clone()),
		(None, Prop::Value(value)) => host.set_attribute(element, attribute_name(name), value),
		(Some(event), Prop::Value(value)) => {
			if cfg!(feature = "dangerous-logging") {
				warn!("Ignoring non-listener value {:?} for event prop {:?} ({:?}).", value, name, event)
			} else {
				warn!("Ignoring non-listener value for event prop {:?} ({:?}).", name, event)
			}
			Ok(())
		}
		(None, Prop::Listener(_)) => {
			warn!("Ignoring listener for prop {:?}, which isn't named `on…`.", name);
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn event_names() {
		assert_eq!(event_name("onClick").as_deref(), Some("click"));
		assert_eq!(event_name("onclick").as_deref(), Some("click"));
		assert_eq!(event_name("ONMouseDown").as_deref(), Some("mouseDown"));
		assert_eq!(event_name("On"), None);
		assert_eq!(event_name("o"), None);
		assert_eq!(event_name("id"), None);
		assert_eq!(event_name("only").as_deref(), Some("ly"));
	}

	#[test]
	fn class_name_is_renamed() {
		assert_eq!(attribute_name("className"), "class");
		assert_eq!(attribute_name("CLASSNAME"), "class");
		assert_eq!(attribute_name("class"), "class");
		assert_eq!(attribute_name("data-id"), "data-id");
	}
}
