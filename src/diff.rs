//! The reconciler: patches the host from one resolved tree to the next.
//!
//! # Known limitations
//!
//! These are deliberate and covered by tests:
//!
//! - Nodes that are [the same](`is_same`) are never patched in place, so their own props and content stay as first mounted.
//! - When the new tree has fewer children than the old one, the surplus host nodes are left where they are.
//! - There is no keyed reordering. Children are matched by index.

use crate::{
	error::Error,
	host::{Host, RangeId},
	node::Props,
	vdom::{VNode, TEXT_NODE_TYPE},
};
use tracing::{instrument, trace, trace_span};

/// Whether `new` can take over `old`'s host nodes as they are.
///
/// That's the case iff
///
/// - the node types match,
/// - every prop of `new` is present and equal in `old`,
/// - `old` doesn't have more props than `new` and
/// - for text nodes, the contents are equal.
#[must_use]
pub fn is_same(old: &VNode, new: &VNode) -> bool {
	if old.node_type() != new.node_type() {
		return false;
	}

	let old_props = old.props();
	let new_props = new.props();
	if let Some(new_props) = new_props {
		for (name, value) in new_props {
			if old_props.and_then(|old_props| old_props.get(name)) != Some(value) {
				return false;
			}
		}
	}
	if old_props.map_or(0, Props::len) > new_props.map_or(0, Props::len) {
		return false;
	}

	if new.node_type() == TEXT_NODE_TYPE && new.content() != old.content() {
		return false;
	}

	true
}

/// Host resources that the new tree no longer refers to.
struct Discarded<N> {
	ranges: Vec<RangeId>,
	/// Roots of detached host subtrees, whose listeners can be dropped.
	nodes: Vec<N>,
}
impl<N> Discarded<N> {
	/// Collects the ranges of `vnode`'s descendants. `vnode`'s own range is passed on to its replacement.
	fn descendant_ranges(&mut self, vnode: &VNode) {
		for child in vnode.vchildren() {
			self.ranges.extend(child.range());
			self.descendant_ranges(child);
		}
	}
}

/// Patches the host so that what `old` materialized now reflects `new`, and assigns `new`'s ranges.
///
/// `old` must have been mounted (or be the result of an earlier `update`).
/// Once the whole tree was patched, the ranges only `old` referred to are released,
/// along with the listeners of host nodes that were replaced. On error, nothing is released.
///
/// # Errors
///
/// [`Error::Unmounted`] if a node of `old` that's needed has no range, and any host error.
#[instrument(skip(host, old, new))]
pub fn update<H: Host>(host: &mut H, old: &VNode, new: &mut VNode) -> Result<(), Error> {
	let mut discarded = Discarded { ranges: Vec::new(), nodes: Vec::new() };
	patch(host, old, new, &mut discarded)?;

	let listeners: usize = discarded.nodes.iter().map(|node| host.release_listeners(node)).sum();
	trace!("Freed {} event listener(s).", listeners);
	for &range in &discarded.ranges {
		host.release_range(range)
	}
	trace!("Freed {} range(s).", discarded.ranges.len());
	Ok(())
}

/// Drops the whole of `vnode` from tracking, including its own range. The host nodes stay as they are.
pub(crate) fn release<H: Host>(host: &mut H, vnode: &VNode) {
	let mut discarded = Discarded { ranges: Vec::new(), nodes: Vec::<H::Node>::new() };
	discarded.ranges.extend(vnode.range());
	discarded.descendant_ranges(vnode);
	for range in discarded.ranges {
		host.release_range(range)
	}
}

fn patch<H: Host>(host: &mut H, old: &VNode, new: &mut VNode, discarded: &mut Discarded<H::Node>) -> Result<(), Error> {
	let range = old.expect_range()?;

	if !is_same(old, new) {
		let span = trace_span!("Replacing mismatching", old = old.node_type(), new = new.node_type(), ?range);
		let _enter = span.enter();
		let replaced = match old {
			VNode::Element(_) => host.node_at_start(range)?,
			VNode::Text(_) => None,
		};
		new.render_to_target(host, range)?;
		discarded.nodes.extend(replaced);
		discarded.descendant_ranges(old);
		return Ok(());
	}

	let span = trace_span!("Adopting", node_type = new.node_type(), ?range);
	let _enter = span.enter();
	new.set_range(range);

	let old_children = old.vchildren();
	let new_children = new.vchildren_mut();
	if new_children.is_empty() {
		discarded.descendant_ranges(old);
		return Ok(());
	}

	if old_children.len() > new_children.len() {
		trace!(
			"Leaving {} surplus child node(s) in place.",
			old_children.len() - new_children.len()
		);
		for surplus in &old_children[new_children.len()..] {
			discarded.ranges.extend(surplus.range());
			discarded.descendant_ranges(surplus);
		}
	}

	let mut tail = old_children.last().map(VNode::expect_range).transpose()?;
	for (i, new_child) in new_children.iter_mut().enumerate() {
		if let Some(old_child) = old_children.get(i) {
			patch(host, old_child, new_child, discarded)?;
			continue;
		}

		let span = trace_span!("Appending", i, node_type = new_child.node_type());
		let _enter = span.enter();
		let child_range = match tail {
			Some(tail) => {
				let (container, offset) = host.range_end(tail)?;
				host.create_collapsed_range(&container, offset)?
			}
			None => append_range(host, range)?,
		};
		new_child.render_to_target(host, child_range)?;
		tail = Some(child_range);
	}

	Ok(())
}

/// A collapsed range after the last child of the node `range` bounds.
fn append_range<H: Host>(host: &mut H, range: RangeId) -> Result<RangeId, Error> {
	let element = host.node_at_start(range)?.ok_or_else(|| Error::Unmounted("element".to_owned()))?;
	let length = host.child_count(&element);
	trace!("No previous children; appending at offset {} of the element itself.", length);
	Ok(host.create_collapsed_range(&element, length)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		node::{Element, Listener, Node, Text},
		props,
	};

	fn resolved(node: impl Into<Node>) -> VNode {
		node.into().resolve(usize::MAX).unwrap()
	}

	#[test]
	fn same_tag_and_props() {
		let old = resolved(Element::new("div").with_prop("id", "a").with_prop("className", "x"));
		let new = resolved(Element::new("div").with_prop("className", "x").with_prop("id", "a"));
		assert!(is_same(&old, &new));
	}

	#[test]
	fn different_tag() {
		assert!(!is_same(&resolved(Element::new("div")), &resolved(Element::new("span"))));
	}

	#[test]
	fn different_prop_value() {
		let old = resolved(Element::new("div").with_prop("id", "a"));
		let new = resolved(Element::new("div").with_prop("id", "b"));
		assert!(!is_same(&old, &new));
	}

	#[test]
	fn prop_added() {
		let old = resolved(Element::new("div"));
		let new = resolved(Element::new("div").with_prop("id", "a"));
		assert!(!is_same(&old, &new));
	}

	#[test]
	fn prop_removed() {
		let old = resolved(Element::new("div").with_prop("id", "a"));
		let new = resolved(Element::new("div"));
		assert!(!is_same(&old, &new));
	}

	#[test]
	fn listeners_by_identity() {
		let listener = Listener::new(|_| ());
		let old = resolved(Element::new("button").with_prop("onClick", listener.clone()));
		let same = resolved(Element::new("button").with_prop("onClick", listener));
		let other = resolved(Element::new("button").with_prop("onClick", Listener::new(|_| ())));
		assert!(is_same(&old, &same));
		assert!(!is_same(&old, &other));
	}

	#[test]
	fn children_are_not_compared() {
		let old = resolved(Element::new("ul").with_child(Element::new("li")));
		let new = resolved(crate::create_element("ul", props! {}, vec![]));
		assert!(is_same(&old, &new));
	}

	#[test]
	fn text_content() {
		assert!(is_same(&resolved(Text::new("a")), &resolved(Text::new("a"))));
		assert!(!is_same(&resolved(Text::new("a")), &resolved(Text::new("b"))));
	}

	#[test]
	fn text_versus_element() {
		assert!(!is_same(&resolved(Text::new("div")), &resolved(Element::new("div"))));
		assert!(!is_same(&resolved(Element::new("div")), &resolved(Text::new("div"))));
	}

	#[test]
	fn unmounted_old_tree() {
		let old = resolved(Element::new("div"));
		let mut new = resolved(Element::new("div"));
		let mut host = crate::memory::MemoryDocument::new();
		assert_eq!(update(&mut host, &old, &mut new), Err(Error::Unmounted("div".to_owned())));
	}
}
