//! The surface a document has to provide so that trees can be mounted into and patched within it.
//!
//! Ranges are owned by the host and handed out as [`RangeId`]s.
//! They are *live*: inserting or removing host nodes adjusts every range's boundary points the way
//! [***Range***](https://developer.mozilla.org/en-US/docs/Web/API/Range)s in a browser document are adjusted,
//! which is what keeps each mounted node's span correct while its siblings are replaced.
//!
//! Ranges (and the listeners of host nodes) that the reconciler no longer tracks are released after each successful update,
//! so that neither grows with the number of updates.

use crate::{error::HostError, node::Listener};
use core::fmt::Debug;

/// Identifies one live range within a [`Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeId(pub(crate) usize);
impl RangeId {
	#[must_use]
	pub fn index(self) -> usize {
		self.0
	}
}

pub trait Host {
	/// A (cheaply cloned) handle to a host node.
	type Node: Clone + Debug;

	fn create_element(&mut self, tag: &str) -> Result<Self::Node, HostError>;
	fn create_text_node(&mut self, content: &str) -> Result<Self::Node, HostError>;

	fn set_attribute(&mut self, element: &Self::Node, name: &str, value: &str) -> Result<(), HostError>;
	fn add_event_listener(&mut self, element: &Self::Node, event: &str, listener: Listener) -> Result<(), HostError>;

	fn child_count(&self, node: &Self::Node) -> u32;

	/// Creates a new range, collapsed at an unspecified position.
	fn create_range(&mut self) -> Result<RangeId, HostError>;

	/// Stops tracking `range`. Its id may be handed out again by a later [`create_range`](`Host::create_range`).
	fn release_range(&mut self, range: RangeId);

	/// Drops the event listeners registered on `node` and its descendants and returns how many there were.
	fn release_listeners(&mut self, node: &Self::Node) -> usize;

	fn set_start(&mut self, range: RangeId, container: &Self::Node, offset: u32) -> Result<(), HostError>;
	fn set_end(&mut self, range: RangeId, container: &Self::Node, offset: u32) -> Result<(), HostError>;
	fn set_start_before(&mut self, range: RangeId, node: &Self::Node) -> Result<(), HostError>;
	fn set_start_after(&mut self, range: RangeId, node: &Self::Node) -> Result<(), HostError>;
	fn set_end_before(&mut self, range: RangeId, node: &Self::Node) -> Result<(), HostError>;
	fn set_end_after(&mut self, range: RangeId, node: &Self::Node) -> Result<(), HostError>;

	/// The end boundary point as (container, offset).
	fn range_end(&self, range: RangeId) -> Result<(Self::Node, u32), HostError>;

	/// The child of the start container at the start offset, if any.
	fn node_at_start(&self, range: RangeId) -> Result<Option<Self::Node>, HostError>;

	/// Inserts `node` at the start of `range`. A collapsed range grows to include it.
	fn insert_node(&mut self, range: RangeId, node: &Self::Node) -> Result<(), HostError>;

	/// Removes everything `range` spans and collapses it to its start.
	fn delete_contents(&mut self, range: RangeId) -> Result<(), HostError>;

	/// Creates a range collapsed at (`container`, `offset`).
	fn create_collapsed_range(&mut self, container: &Self::Node, offset: u32) -> Result<RangeId, HostError> {
		let range = self.create_range()?;
		self.set_start(range, container, offset)?;
		self.set_end(range, container, offset)?;
		Ok(range)
	}

	/// Replaces whatever `range` spans with `node` and shrinks `range` to bound exactly that node.
	fn replace_contents(&mut self, range: RangeId, node: &Self::Node) -> Result<(), HostError> {
		self.insert_node(range, node)?;

		self.set_start_after(range, node)?;
		self.delete_contents(range)?;

		self.set_start_before(range, node)?;
		self.set_end_after(range, node)
	}
}
