//! A deterministic in-memory document, mainly for tests.
//!
//! Ranges behave like live DOM ranges restricted to what the reconciler needs:
//! [`insert_node`](`Host::insert_node`) requires an element start container,
//! and [`delete_contents`](`Host::delete_contents`) requires both boundary points to share their container.
//!
//! Released range slots are reused. Node storage is not, so [`NodeId`]s stay valid for the life of the document.

use crate::{
	error::HostError,
	host::{Host, RangeId},
	node::{Event, Listener},
};
use core::{cmp::Ordering, convert::TryInto, fmt::Write as _};
use std::cell::RefCell;
use tracing::{instrument, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
enum NodeKind {
	Document,
	Element {
		tag: String,
		attributes: hashbrown::HashMap<String, String>,
		listeners: Vec<(String, Listener)>,
	},
	Text(String),
}

#[derive(Debug)]
struct NodeData {
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Boundary {
	container: NodeId,
	offset: u32,
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
	start: Boundary,
	end: Boundary,
}

#[derive(Debug)]
pub struct MemoryDocument {
	nodes: Vec<NodeData>,
	ranges: Vec<Option<Bounds>>,
	free_ranges: Vec<usize>,
	mutations: usize,
}
impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}

fn length_u32(length: usize) -> u32 {
	length.try_into().unwrap_or(u32::MAX)
}

impl MemoryDocument {
	#[must_use]
	pub fn new() -> Self {
		Self {
			nodes: vec![NodeData {
				parent: None,
				children: Vec::new(),
				kind: NodeKind::Document,
			}],
			ranges: Vec::new(),
			free_ranges: Vec::new(),
			mutations: 0,
		}
	}

	/// The document node. It accepts children like an element, but has no tag.
	#[must_use]
	pub fn document(&self) -> NodeId {
		NodeId(0)
	}

	/// How many insertions, removals, attribute and listener changes happened so far.
	#[must_use]
	pub fn mutation_count(&self) -> usize {
		self.mutations
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes[node.0].parent
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.nodes[node.0].children
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		match &self.nodes[node.0].kind {
			NodeKind::Element { tag, .. } => Some(tag),
			NodeKind::Document | NodeKind::Text(_) => None,
		}
	}

	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match &self.nodes[node.0].kind {
			NodeKind::Text(text) => Some(text),
			NodeKind::Document | NodeKind::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		match &self.nodes[node.0].kind {
			NodeKind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
			NodeKind::Document | NodeKind::Text(_) => None,
		}
	}

	/// The (container, offset) pairs of both boundary points of `range`, or [`None`] if it isn't live.
	#[must_use]
	pub fn bounds(&self, range: RangeId) -> Option<((NodeId, u32), (NodeId, u32))> {
		let Bounds { start, end } = self.live(range, "bounds").ok()?;
		Some(((start.container, start.offset), (end.container, end.offset)))
	}

	/// How many ranges are currently tracked (and adjusted on each mutation).
	#[must_use]
	pub fn live_range_count(&self) -> usize {
		self.ranges.len() - self.free_ranges.len()
	}

	/// How many listeners are registered on `node` and its descendants.
	#[must_use]
	pub fn listener_count(&self, node: NodeId) -> usize {
		let own = match &self.nodes[node.0].kind {
			NodeKind::Element { listeners, .. } => listeners.len(),
			NodeKind::Document | NodeKind::Text(_) => 0,
		};
		own + self.nodes[node.0].children.iter().map(|&child| self.listener_count(child)).sum::<usize>()
	}

	/// The nodes `range` spans, given both boundary points share a container. Empty if `range` isn't live.
	#[must_use]
	pub fn spanned(&self, range: RangeId) -> &[NodeId] {
		let Bounds { start, end } = match self.live(range, "spanned") {
			Ok(bounds) => bounds,
			Err(_) => return &[],
		};
		if start.container != end.container {
			return &[];
		}
		let children = &self.nodes[start.container.0].children;
		let start = (start.offset as usize).min(children.len());
		let end = (end.offset as usize).min(children.len()).max(start);
		&children[start..end]
	}

	/// Appends `child` to `parent` directly, outside of any range. Useful for setting up fixtures.
	///
	/// # Errors
	///
	/// Iff `parent` is a text node.
	pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
		self.remove_child(child);
		let index = length_u32(self.nodes[parent.0].children.len());
		self.insert_child(parent, index, child, "appendChild")
	}

	/// Serializes the children of `node`, with attributes sorted by name.
	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		for &child in &self.nodes[node.0].children {
			self.write_html(child, &mut html)
		}
		html
	}

	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		match &self.nodes[node.0].kind {
			NodeKind::Document => html.push_str(&self.inner_html(node)),
			NodeKind::Text(text) => escape_into(text, html),
			NodeKind::Element { tag, attributes, .. } => {
				let mut attributes: Vec<_> = attributes.iter().collect();
				attributes.sort();
				html.push('<');
				html.push_str(tag);
				for (name, value) in attributes {
					let _ = write!(html, " {}=\"", name);
					escape_into(value, html);
					html.push('"');
				}
				html.push('>');
				for &child in &self.nodes[node.0].children {
					self.write_html(child, html)
				}
				let _ = write!(html, "</{}>", tag);
			}
		}
	}

	/// Calls the listeners registered on `target` for `kind`, without holding a borrow of the document,
	/// so that they may borrow it mutably (for example to [`set_state`](`crate::ComponentRef::set_state`)).
	///
	/// Returns how many listeners were called.
	pub fn dispatch(document: &RefCell<Self>, target: NodeId, kind: &str) -> usize {
		let listeners: Vec<Listener> = match &document.borrow().nodes[target.0].kind {
			NodeKind::Element { listeners, .. } => listeners.iter().filter(|(name, _)| name == kind).map(|(_, listener)| listener.clone()).collect(),
			NodeKind::Document | NodeKind::Text(_) => Vec::new(),
		};

		let event = Event::new(kind);
		for listener in &listeners {
			listener.call(&event)
		}
		listeners.len()
	}

	fn live(&self, range: RangeId, operation: &'static str) -> Result<Bounds, HostError> {
		self.ranges
			.get(range.0)
			.copied()
			.flatten()
			.ok_or_else(|| HostError::new(operation, format!("{:?} is not a live range of this document", range)))
	}

	fn live_mut(&mut self, range: RangeId, operation: &'static str) -> Result<&mut Bounds, HostError> {
		self.ranges
			.get_mut(range.0)
			.and_then(Option::as_mut)
			.ok_or_else(|| HostError::new(operation, format!("{:?} is not a live range of this document", range)))
	}

	fn push_node(&mut self, kind: NodeKind) -> NodeId {
		self.nodes.push(NodeData {
			parent: None,
			children: Vec::new(),
			kind,
		});
		NodeId(self.nodes.len() - 1)
	}

	fn node_length(&self, node: NodeId) -> u32 {
		match &self.nodes[node.0].kind {
			NodeKind::Text(text) => length_u32(text.chars().count()),
			NodeKind::Document | NodeKind::Element { .. } => length_u32(self.nodes[node.0].children.len()),
		}
	}

	fn index(&self, node: NodeId) -> Option<(NodeId, u32)> {
		let parent = self.nodes[node.0].parent?;
		let index = self.nodes[parent.0].children.iter().position(|&child| child == node)?;
		Some((parent, length_u32(index)))
	}

	fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
		loop {
			if node == ancestor {
				return true;
			}
			match self.nodes[node.0].parent {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	/// The root of `boundary`'s tree and the child indices leading to it, followed by its offset.
	fn path(&self, boundary: Boundary) -> (NodeId, Vec<u32>) {
		let mut path = vec![boundary.offset];
		let mut node = boundary.container;
		while let Some((parent, index)) = self.index(node) {
			path.push(index);
			node = parent;
		}
		path.reverse();
		(node, path)
	}

	/// Tree order of two boundary points, or [`None`] if they are in different trees.
	fn compare(&self, a: Boundary, b: Boundary) -> Option<Ordering> {
		let (root_a, path_a) = self.path(a);
		let (root_b, path_b) = self.path(b);
		if root_a == root_b {
			Some(path_a.cmp(&path_b))
		} else {
			None
		}
	}

	fn check_boundary(&self, container: NodeId, offset: u32, operation: &'static str) -> Result<Boundary, HostError> {
		if offset > self.node_length(container) {
			return Err(HostError::new(operation, format!("offset {} is larger than the length of {:?}", offset, container)));
		}
		Ok(Boundary { container, offset })
	}

	fn set_start_boundary(&mut self, range: RangeId, start: Boundary, operation: &'static str) -> Result<(), HostError> {
		let end = self.live(range, operation)?.end;
		let collapse = !matches!(self.compare(start, end), Some(Ordering::Less | Ordering::Equal));
		let bounds = self.live_mut(range, operation)?;
		bounds.start = start;
		if collapse {
			bounds.end = start;
		}
		Ok(())
	}

	fn set_end_boundary(&mut self, range: RangeId, end: Boundary, operation: &'static str) -> Result<(), HostError> {
		let start = self.live(range, operation)?.start;
		let collapse = !matches!(self.compare(start, end), Some(Ordering::Less | Ordering::Equal));
		let bounds = self.live_mut(range, operation)?;
		bounds.end = end;
		if collapse {
			bounds.start = end;
		}
		Ok(())
	}

	fn parent_index(&self, node: NodeId, operation: &'static str) -> Result<(NodeId, u32), HostError> {
		self.index(node).ok_or_else(|| HostError::new(operation, format!("{:?} has no parent", node)))
	}

	fn insert_child(&mut self, parent: NodeId, index: u32, child: NodeId, operation: &'static str) -> Result<(), HostError> {
		if let NodeKind::Text(_) = self.nodes[parent.0].kind {
			return Err(HostError::new(operation, "text nodes can't have children"));
		}
		if self.is_inclusive_ancestor(child, parent) {
			return Err(HostError::new(operation, format!("{:?} would become its own descendant", child)));
		}
		debug_assert_eq!(self.nodes[child.0].parent, None);

		for bounds in self.ranges.iter_mut().flatten() {
			for boundary in [&mut bounds.start, &mut bounds.end].iter_mut() {
				if boundary.container == parent && boundary.offset > index {
					boundary.offset += 1;
				}
			}
		}

		self.nodes[parent.0].children.insert(index as usize, child);
		self.nodes[child.0].parent = Some(parent);
		self.mutations += 1;
		Ok(())
	}

	fn remove_child(&mut self, child: NodeId) {
		let (parent, index) = match self.index(child) {
			Some(parent_index) => parent_index,
			None => return,
		};

		let ranges = core::mem::take(&mut self.ranges);
		self.ranges = ranges
			.into_iter()
			.map(|bounds| {
				let mut bounds = bounds?;
				for boundary in [&mut bounds.start, &mut bounds.end].iter_mut() {
					if self.is_inclusive_ancestor(child, boundary.container) {
						**boundary = Boundary { container: parent, offset: index };
					} else if boundary.container == parent && boundary.offset > index {
						boundary.offset -= 1;
					}
				}
				Some(bounds)
			})
			.collect();

		self.nodes[parent.0].children.remove(index as usize);
		self.nodes[child.0].parent = None;
		self.mutations += 1;
	}
}

fn escape_into(text: &str, html: &mut String) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			'"' => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

impl Host for MemoryDocument {
	type Node = NodeId;

	fn create_element(&mut self, tag: &str) -> Result<NodeId, HostError> {
		if tag.is_empty() {
			return Err(HostError::new("createElement", "empty tag name"));
		}
		Ok(self.push_node(NodeKind::Element {
			tag: tag.to_owned(),
			attributes: hashbrown::HashMap::new(),
			listeners: Vec::new(),
		}))
	}

	fn create_text_node(&mut self, content: &str) -> Result<NodeId, HostError> {
		Ok(self.push_node(NodeKind::Text(content.to_owned())))
	}

	fn set_attribute(&mut self, element: &NodeId, name: &str, value: &str) -> Result<(), HostError> {
		match &mut self.nodes[element.0].kind {
			NodeKind::Element { attributes, .. } => {
				attributes.insert(name.to_owned(), value.to_owned());
				self.mutations += 1;
				Ok(())
			}
			NodeKind::Document | NodeKind::Text(_) => Err(HostError::new("setAttribute", format!("{:?} is not an element", element))),
		}
	}

	fn add_event_listener(&mut self, element: &NodeId, event: &str, listener: Listener) -> Result<(), HostError> {
		match &mut self.nodes[element.0].kind {
			NodeKind::Element { listeners, .. } => {
				listeners.push((event.to_owned(), listener));
				self.mutations += 1;
				Ok(())
			}
			NodeKind::Document | NodeKind::Text(_) => Err(HostError::new("addEventListener", format!("{:?} is not an element", element))),
		}
	}

	fn child_count(&self, node: &NodeId) -> u32 {
		length_u32(self.nodes[node.0].children.len())
	}

	fn create_range(&mut self) -> Result<RangeId, HostError> {
		let boundary = Boundary {
			container: self.document(),
			offset: 0,
		};
		let bounds = Some(Bounds { start: boundary, end: boundary });
		Ok(match self.free_ranges.pop() {
			Some(index) => {
				self.ranges[index] = bounds;
				RangeId(index)
			}
			None => {
				self.ranges.push(bounds);
				RangeId(self.ranges.len() - 1)
			}
		})
	}

	fn release_range(&mut self, range: RangeId) {
		if let Some(Some(_)) = self.ranges.get_mut(range.0).map(Option::take) {
			self.free_ranges.push(range.0)
		} else {
			warn!("Tried to release {:?}, which is not live.", range)
		}
	}

	fn release_listeners(&mut self, node: &NodeId) -> usize {
		let mut released = match &mut self.nodes[node.0].kind {
			NodeKind::Element { listeners, .. } => core::mem::take(listeners).len(),
			NodeKind::Document | NodeKind::Text(_) => 0,
		};
		for child in self.nodes[node.0].children.clone() {
			released += self.release_listeners(&child);
		}
		released
	}

	fn set_start(&mut self, range: RangeId, container: &NodeId, offset: u32) -> Result<(), HostError> {
		let start = self.check_boundary(*container, offset, "setStart")?;
		self.set_start_boundary(range, start, "setStart")
	}

	fn set_end(&mut self, range: RangeId, container: &NodeId, offset: u32) -> Result<(), HostError> {
		let end = self.check_boundary(*container, offset, "setEnd")?;
		self.set_end_boundary(range, end, "setEnd")
	}

	fn set_start_before(&mut self, range: RangeId, node: &NodeId) -> Result<(), HostError> {
		let (container, offset) = self.parent_index(*node, "setStartBefore")?;
		self.set_start_boundary(range, Boundary { container, offset }, "setStartBefore")
	}

	fn set_start_after(&mut self, range: RangeId, node: &NodeId) -> Result<(), HostError> {
		let (container, offset) = self.parent_index(*node, "setStartAfter")?;
		self.set_start_boundary(range, Boundary { container, offset: offset + 1 }, "setStartAfter")
	}

	fn set_end_before(&mut self, range: RangeId, node: &NodeId) -> Result<(), HostError> {
		let (container, offset) = self.parent_index(*node, "setEndBefore")?;
		self.set_end_boundary(range, Boundary { container, offset }, "setEndBefore")
	}

	fn set_end_after(&mut self, range: RangeId, node: &NodeId) -> Result<(), HostError> {
		let (container, offset) = self.parent_index(*node, "setEndAfter")?;
		self.set_end_boundary(range, Boundary { container, offset: offset + 1 }, "setEndAfter")
	}

	fn range_end(&self, range: RangeId) -> Result<(NodeId, u32), HostError> {
		let end = self.live(range, "endContainer")?.end;
		Ok((end.container, end.offset))
	}

	fn node_at_start(&self, range: RangeId) -> Result<Option<NodeId>, HostError> {
		let start = self.live(range, "startContainer")?.start;
		Ok(self.nodes[start.container.0].children.get(start.offset as usize).copied())
	}

	#[instrument(skip(self))]
	fn insert_node(&mut self, range: RangeId, node: &NodeId) -> Result<(), HostError> {
		let Bounds { start, .. } = self.live(range, "insertNode")?;
		if let NodeKind::Text(_) = self.nodes[start.container.0].kind {
			return Err(HostError::new("insertNode", "splitting text nodes is not supported"));
		}

		let parent = start.container;
		let mut reference = self.nodes[parent.0].children.get(start.offset as usize).copied();
		if reference == Some(*node) {
			reference = self.nodes[parent.0].children.get(start.offset as usize + 1).copied();
		}
		self.remove_child(*node);

		let index = match reference {
			Some(reference) => self.parent_index(reference, "insertNode")?.1,
			None => length_u32(self.nodes[parent.0].children.len()),
		};
		self.insert_child(parent, index, *node, "insertNode")?;

		let bounds = self.live_mut(range, "insertNode")?;
		if bounds.start == bounds.end {
			bounds.end = Boundary { container: parent, offset: index + 1 };
		}
		trace!("Inserted {:?} into {:?} at {}.", node, parent, index);
		Ok(())
	}

	#[instrument(skip(self))]
	fn delete_contents(&mut self, range: RangeId) -> Result<(), HostError> {
		let Bounds { start, end } = self.live(range, "deleteContents")?;
		if start == end {
			return Ok(());
		}
		if start.container != end.container {
			return Err(HostError::new("deleteContents", "boundary points in different containers are not supported"));
		}
		if let NodeKind::Text(_) = self.nodes[start.container.0].kind {
			return Err(HostError::new("deleteContents", "deleting text data is not supported"));
		}

		let removed: Vec<NodeId> = self.nodes[start.container.0].children[start.offset as usize..end.offset as usize].to_vec();
		trace!("Removing {} node(s).", removed.len());
		for node in removed {
			self.remove_child(node)
		}

		let bounds = self.live_mut(range, "deleteContents")?;
		bounds.start = start;
		bounds.end = start;
		Ok(())
	}
}
