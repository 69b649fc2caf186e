//! Resolved trees: only elements and text, each remembering the range it was mounted into.

use crate::{
	attributes,
	error::Error,
	host::{Host, RangeId},
	node::Props,
};
use tracing::{instrument, trace, trace_span};

/// The node type of [`VNode::Text`]. Element tags are compared against it as plain strings.
pub const TEXT_NODE_TYPE: &str = "#text";

#[derive(Debug, Clone)]
pub enum VNode {
	Element(VElement),
	Text(VText),
}

#[derive(Debug, Clone)]
pub struct VElement {
	pub(crate) tag: String,
	pub(crate) props: Props,
	pub(crate) vchildren: Vec<VNode>,
	pub(crate) range: Option<RangeId>,
}

#[derive(Debug, Clone)]
pub struct VText {
	pub(crate) content: String,
	pub(crate) range: Option<RangeId>,
}

impl VNode {
	/// The element tag, or [`TEXT_NODE_TYPE`].
	#[must_use]
	pub fn node_type(&self) -> &str {
		match self {
			VNode::Element(element) => &element.tag,
			VNode::Text(_) => TEXT_NODE_TYPE,
		}
	}

	#[must_use]
	pub fn props(&self) -> Option<&Props> {
		match self {
			VNode::Element(element) => Some(&element.props),
			VNode::Text(_) => None,
		}
	}

	#[must_use]
	pub fn content(&self) -> Option<&str> {
		match self {
			VNode::Element(_) => None,
			VNode::Text(text) => Some(&text.content),
		}
	}

	#[must_use]
	pub fn vchildren(&self) -> &[VNode] {
		match self {
			VNode::Element(element) => &element.vchildren,
			VNode::Text(_) => &[],
		}
	}

	pub(crate) fn vchildren_mut(&mut self) -> &mut [VNode] {
		match self {
			VNode::Element(element) => &mut element.vchildren,
			VNode::Text(_) => &mut [],
		}
	}

	/// The range this node currently owns, or [`None`] if it was never mounted.
	#[must_use]
	pub fn range(&self) -> Option<RangeId> {
		match self {
			VNode::Element(element) => element.range,
			VNode::Text(text) => text.range,
		}
	}

	pub(crate) fn set_range(&mut self, range: RangeId) {
		match self {
			VNode::Element(element) => element.range = Some(range),
			VNode::Text(text) => text.range = Some(range),
		}
	}

	pub(crate) fn expect_range(&self) -> Result<RangeId, Error> {
		self.range().ok_or_else(|| Error::Unmounted(self.node_type().to_owned()))
	}

	/// Materializes this tree in place of whatever `range` currently spans, then narrows `range` to it.
	#[instrument(skip(self, host))]
	pub(crate) fn render_to_target<H: Host>(&mut self, host: &mut H, range: RangeId) -> Result<(), Error> {
		match self {
			VNode::Element(VElement { tag, props, vchildren, range: own_range }) => {
				let span = trace_span!("Mounting element", tag = tag.as_str(), "props.len()" = props.len(), "vchildren.len()" = vchildren.len());
				let _enter = span.enter();
				*own_range = Some(range);

				let root = host.create_element(tag)?;
				for (name, value) in props.iter() {
					attributes::bind_prop(host, &root, name, value)?;
				}

				for child in vchildren {
					let length = host.child_count(&root);
					let child_range = host.create_collapsed_range(&root, length)?;
					child.render_to_target(host, child_range)?;
				}

				host.replace_contents(range, &root)?;
			}

			VNode::Text(VText { content, range: own_range }) => {
				let span = if cfg!(feature = "dangerous-logging") {
					trace_span!("Mounting text node", content = content.as_str())
				} else {
					trace_span!("Mounting text node", "content.len()" = content.len())
				};
				let _enter = span.enter();
				*own_range = Some(range);

				let text = host.create_text_node(content)?;
				host.replace_contents(range, &text)?;
			}
		}
		trace!("Mounted into {:?}.", range);
		Ok(())
	}
}
