//! A minimal component reconciler.
//!
//! A [`Node`] tree of components, elements and text is [resolved](`Node::resolve`) into a [`VNode`] tree of only elements and text,
//! which is mounted into a [`Host`] document. Each mounted node owns a live range spanning exactly the host nodes it produced.
//! When a component's state changes, it re-renders and the [reconciler](`diff`) patches the host from the previous resolved tree to the new one,
//! replacing only the spans of nodes that aren't [the same](`diff::is_same`) anymore.

#![doc(html_root_url = "https://docs.rs/ranged-dom/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attributes;
pub mod component;
pub mod diff;
mod error;
pub mod host;
pub mod memory;
pub mod node;
pub mod state;
pub mod vdom;
pub mod web;

pub use component::{Component, ComponentRef, Context, WeakComponentRef};
pub use error::{Error, HostError};
pub use host::{Host, RangeId};
pub use node::{create_element, Child, Element, Event, Listener, Node, Prop, Props, Tag, Text};
pub use serde_json;
pub use vdom::VNode;

use tracing::instrument;

/// How deeply component trees may nest by default, counting each rendered component and element as one level.
pub const DEFAULT_DEPTH_LIMIT: usize = 1024;

/// Clears `container` and mounts `node` into it.
///
/// If `node` is a [`Node::Composite`], the component retains its resolved tree and can be updated afterwards.
///
/// # Errors
///
/// [`Error::DepthLimit`] if rendering nests deeper than `depth_limit`, or any host error.
#[instrument(skip(host, node))]
pub fn render<H: Host>(host: &mut H, node: &Node, container: &H::Node, depth_limit: usize) -> Result<(), Error> {
	let range = host.create_range()?;
	host.set_start(range, container, 0)?;
	let length = host.child_count(container);
	host.set_end(range, container, length)?;
	host.delete_contents(range)?;

	node.render_to_target(host, range, depth_limit)
}
