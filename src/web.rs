//! [`Host`] over a browser [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document).

use crate::{
	error::HostError,
	host::{Host, RangeId},
	node::{Event, Listener},
};
use core::fmt::{self, Debug, Formatter};
use js_sys::Function;
use tracing::{instrument, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// An event listener closure and the element it's registered on.
struct BoundListener {
	element: web_sys::Node,
	event: String,
	closure: Closure<dyn Fn(web_sys::Event)>,
}

/// Owns the ranges and event listener closures created while mounting into `document`.
///
/// Dropping this instance makes the listeners it registered throw into ***JavaScript*** when their events fire.
pub struct WebHost {
	document: web_sys::Document,
	ranges: Vec<Option<web_sys::Range>>,
	free_ranges: Vec<usize>,
	listeners: Vec<BoundListener>,
}
impl Debug for WebHost {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebHost")
			.field("document", &self.document)
			.field("live ranges", &(self.ranges.len() - self.free_ranges.len()))
			.field("listeners.len()", &self.listeners.len())
			.finish()
	}
}

fn js_error(operation: &'static str) -> impl FnOnce(JsValue) -> HostError {
	move |error| HostError::new(operation, format!("{:?}", error))
}

impl WebHost {
	#[must_use]
	#[instrument]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			ranges: Vec::new(),
			free_ranges: Vec::new(),
			listeners: Vec::new(),
		}
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// The `web_sys::Range` behind `range`, if it's live.
	#[must_use]
	pub fn range(&self, range: RangeId) -> Option<&web_sys::Range> {
		self.ranges.get(range.0)?.as_ref()
	}

	#[must_use]
	pub fn live_range_count(&self) -> usize {
		self.ranges.len() - self.free_ranges.len()
	}

	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	fn live(&self, range: RangeId, operation: &'static str) -> Result<&web_sys::Range, HostError> {
		self.range(range).ok_or_else(|| HostError::new(operation, format!("{:?} is not a live range of this host", range)))
	}

	fn element<'a>(node: &'a web_sys::Node, operation: &'static str) -> Result<&'a web_sys::Element, HostError> {
		node.dyn_ref::<web_sys::Element>().ok_or_else(|| HostError::new(operation, format!("{:?} is not an element", node)))
	}
}

impl Host for WebHost {
	type Node = web_sys::Node;

	fn create_element(&mut self, tag: &str) -> Result<web_sys::Node, HostError> {
		Ok(self.document.create_element(tag).map_err(js_error("createElement"))?.into())
	}

	fn create_text_node(&mut self, content: &str) -> Result<web_sys::Node, HostError> {
		Ok(self.document.create_text_node(content).into())
	}

	fn set_attribute(&mut self, element: &web_sys::Node, name: &str, value: &str) -> Result<(), HostError> {
		Self::element(element, "setAttribute")?.set_attribute(name, value).map_err(js_error("setAttribute"))
	}

	#[instrument(skip(self, listener))]
	fn add_event_listener(&mut self, element: &web_sys::Node, event: &str, listener: Listener) -> Result<(), HostError> {
		let closure = Closure::wrap(Box::new(move |event: web_sys::Event| listener.call(&Event::new(event.type_()))) as Box<dyn Fn(web_sys::Event)>);
		element
			.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>())
			.map_err(js_error("addEventListener"))?;
		self.listeners.push(BoundListener {
			element: element.clone(),
			event: event.to_owned(),
			closure,
		});
		trace!("Listener count: {}", self.listeners.len());
		Ok(())
	}

	fn child_count(&self, node: &web_sys::Node) -> u32 {
		node.child_nodes().length()
	}

	fn create_range(&mut self) -> Result<RangeId, HostError> {
		let range = Some(self.document.create_range().map_err(js_error("createRange"))?);
		Ok(match self.free_ranges.pop() {
			Some(index) => {
				self.ranges[index] = range;
				RangeId(index)
			}
			None => {
				self.ranges.push(range);
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

	#[instrument(skip(self))]
	fn release_listeners(&mut self, node: &web_sys::Node) -> usize {
		let (released, kept): (Vec<_>, Vec<_>) = core::mem::take(&mut self.listeners)
			.into_iter()
			.partition(|bound| node.contains(Some(&bound.element)));
		self.listeners = kept;

		for bound in &released {
			if let Err(error) = bound
				.element
				.remove_event_listener_with_callback(&bound.event, bound.closure.as_ref().unchecked_ref::<Function>())
			{
				warn!("Failed to remove {:?} listener: {:?}", bound.event, error);
			}
		}
		trace!("Listener count: {}", self.listeners.len());
		released.len()
	}

	fn set_start(&mut self, range: RangeId, container: &web_sys::Node, offset: u32) -> Result<(), HostError> {
		self.live(range, "setStart")?.set_start(container, offset).map_err(js_error("setStart"))
	}

	fn set_end(&mut self, range: RangeId, container: &web_sys::Node, offset: u32) -> Result<(), HostError> {
		self.live(range, "setEnd")?.set_end(container, offset).map_err(js_error("setEnd"))
	}

	fn set_start_before(&mut self, range: RangeId, node: &web_sys::Node) -> Result<(), HostError> {
		self.live(range, "setStartBefore")?.set_start_before(node).map_err(js_error("setStartBefore"))
	}

	fn set_start_after(&mut self, range: RangeId, node: &web_sys::Node) -> Result<(), HostError> {
		self.live(range, "setStartAfter")?.set_start_after(node).map_err(js_error("setStartAfter"))
	}

	fn set_end_before(&mut self, range: RangeId, node: &web_sys::Node) -> Result<(), HostError> {
		self.live(range, "setEndBefore")?.set_end_before(node).map_err(js_error("setEndBefore"))
	}

	fn set_end_after(&mut self, range: RangeId, node: &web_sys::Node) -> Result<(), HostError> {
		self.live(range, "setEndAfter")?.set_end_after(node).map_err(js_error("setEndAfter"))
	}

	fn range_end(&self, range: RangeId) -> Result<(web_sys::Node, u32), HostError> {
		let range = self.live(range, "endContainer")?;
		Ok((
			range.end_container().map_err(js_error("endContainer"))?,
			range.end_offset().map_err(js_error("endOffset"))?,
		))
	}

	fn node_at_start(&self, range: RangeId) -> Result<Option<web_sys::Node>, HostError> {
		let range = self.live(range, "startContainer")?;
		let container = range.start_container().map_err(js_error("startContainer"))?;
		let offset = range.start_offset().map_err(js_error("startOffset"))?;
		Ok(container.child_nodes().item(offset))
	}

	fn insert_node(&mut self, range: RangeId, node: &web_sys::Node) -> Result<(), HostError> {
		self.live(range, "insertNode")?.insert_node(node).map_err(js_error("insertNode"))
	}

	fn delete_contents(&mut self, range: RangeId) -> Result<(), HostError> {
		self.live(range, "deleteContents")?.delete_contents().map_err(js_error("deleteContents"))
	}
}
