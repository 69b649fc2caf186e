//! Unresolved component trees, as assembled by [`create_element`] or the builder methods.

use crate::{
	component::ComponentRef,
	error::Error,
	host::{Host, RangeId},
	vdom::{VElement, VNode, VText},
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::trace;

pub type Props = hashbrown::HashMap<String, Prop>;

/// A prop value. Which kind is expected depends on the name, see [`crate::attributes`].
#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
	Value(String),
	Listener(Listener),
}
impl From<&str> for Prop {
	fn from(value: &str) -> Self {
		Self::Value(value.to_owned())
	}
}
impl From<String> for Prop {
	fn from(value: String) -> Self {
		Self::Value(value)
	}
}
impl From<Listener> for Prop {
	fn from(listener: Listener) -> Self {
		Self::Listener(listener)
	}
}

/// An event handler. Two listeners are equal only if they are clones of each other.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);
impl Listener {
	pub fn new(handler: impl 'static + Fn(&Event)) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &Event) {
		(self.0)(event)
	}
}
impl PartialEq for Listener {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Debug for Listener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Listener").field(&Rc::as_ptr(&self.0).cast::<()>()).finish()
	}
}

/// What a [`Listener`] receives when its event fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
	kind: String,
}
impl Event {
	#[must_use]
	pub fn new(kind: impl Into<String>) -> Self {
		Self { kind: kind.into() }
	}

	/// The event name, e.g. `"click"`.
	#[must_use]
	pub fn kind(&self) -> &str {
		&self.kind
	}
}

#[derive(Debug, Clone)]
pub enum Node {
	Composite(ComponentRef),
	Element(Element),
	Text(Text),
}

#[derive(Debug, Clone)]
pub struct Element {
	pub(crate) tag: String,
	pub(crate) props: Props,
	pub(crate) children: Vec<Node>,
}
impl Element {
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			props: Props::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Prop>) -> Self {
		self.set_attribute(name, value);
		self
	}

	#[must_use]
	pub fn with_child(mut self, child: impl Into<Child>) -> Self {
		child.into().flatten_into(&mut self.children);
		self
	}

	pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Prop>) {
		self.props.insert(name.into(), value.into());
	}

	pub fn append_child(&mut self, child: Node) {
		self.children.push(child)
	}

	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn props(&self) -> &Props {
		&self.props
	}

	#[must_use]
	pub fn children(&self) -> &[Node] {
		&self.children
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
	pub(crate) content: String,
}
impl Text {
	#[must_use]
	pub fn new(content: impl Into<String>) -> Self {
		Self { content: content.into() }
	}

	#[must_use]
	pub fn content(&self) -> &str {
		&self.content
	}
}

impl From<Element> for Node {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}
impl From<Text> for Node {
	fn from(text: Text) -> Self {
		Self::Text(text)
	}
}
impl From<ComponentRef> for Node {
	fn from(component: ComponentRef) -> Self {
		Self::Composite(component)
	}
}
impl From<&str> for Node {
	fn from(content: &str) -> Self {
		Self::Text(Text::new(content))
	}
}
impl From<String> for Node {
	fn from(content: String) -> Self {
		Self::Text(Text::new(content))
	}
}

impl Node {
	/// Renders composites (recursively) and resolves children until only elements and text remain.
	///
	/// Every call produces a fresh tree without ranges.
	///
	/// # Errors
	///
	/// Iff rendering nests deeper than `depth_limit`.
	pub fn resolve(&self, depth_limit: usize) -> Result<VNode, Error> {
		if depth_limit == 0 {
			return Err(Error::DepthLimit);
		}

		Ok(match self {
			Node::Composite(component) => return component.render().resolve(depth_limit - 1),
			Node::Element(Element { tag, props, children }) => VNode::Element(VElement {
				tag: tag.clone(),
				props: props.clone(),
				vchildren: children.iter().map(|child| child.resolve(depth_limit - 1)).collect::<Result<_, _>>()?,
				range: None,
			}),
			Node::Text(Text { content }) => VNode::Text(VText {
				content: content.clone(),
				range: None,
			}),
		})
	}

	pub(crate) fn render_to_target<H: Host>(&self, host: &mut H, range: RangeId, depth_limit: usize) -> Result<(), Error> {
		match self {
			Node::Composite(component) => component.render_to_target(host, range, depth_limit),
			Node::Element(_) | Node::Text(_) => {
				trace!("Mounting a leaf without component; its resolved tree won't be retained.");
				self.resolve(depth_limit)?.render_to_target(host, range)
			}
		}
	}
}

/// What [`create_element`] accepts as children: nodes, nothing, or nested sequences of either.
#[derive(Debug, Clone)]
pub enum Child {
	Node(Node),
	Skip,
	Many(Vec<Child>),
}
impl Child {
	fn flatten_into(self, children: &mut Vec<Node>) {
		match self {
			Child::Node(node) => children.push(node),
			Child::Skip => (),
			Child::Many(many) => {
				for child in many {
					child.flatten_into(children)
				}
			}
		}
	}
}
impl From<Node> for Child {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}
impl From<Element> for Child {
	fn from(element: Element) -> Self {
		Self::Node(element.into())
	}
}
impl From<Text> for Child {
	fn from(text: Text) -> Self {
		Self::Node(text.into())
	}
}
impl From<ComponentRef> for Child {
	fn from(component: ComponentRef) -> Self {
		Self::Node(component.into())
	}
}
impl From<&str> for Child {
	fn from(content: &str) -> Self {
		Self::Node(content.into())
	}
}
impl From<String> for Child {
	fn from(content: String) -> Self {
		Self::Node(content.into())
	}
}
impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(child: Option<T>) -> Self {
		child.map_or(Self::Skip, Into::into)
	}
}
impl<T: Into<Child>> From<Vec<T>> for Child {
	fn from(children: Vec<T>) -> Self {
		Self::Many(children.into_iter().map(Into::into).collect())
	}
}

/// Either a host tag name or a component instance.
#[derive(Debug, Clone)]
pub enum Tag {
	Name(String),
	Component(ComponentRef),
}
impl From<&str> for Tag {
	fn from(name: &str) -> Self {
		Self::Name(name.to_owned())
	}
}
impl From<String> for Tag {
	fn from(name: String) -> Self {
		Self::Name(name)
	}
}
impl From<ComponentRef> for Tag {
	fn from(component: ComponentRef) -> Self {
		Self::Component(component)
	}
}

/// Assembles a node from a tag (or component), its attributes and children.
///
/// Strings among the children become text nodes, [`None`]s are skipped and nested [`Vec`]s are flattened.
pub fn create_element(tag: impl Into<Tag>, attributes: Props, children: Vec<Child>) -> Node {
	let mut flat = Vec::new();
	Child::Many(children).flatten_into(&mut flat);

	match tag.into() {
		Tag::Name(name) => {
			let mut element = Element::new(name);
			for (name, value) in attributes {
				element.set_attribute(name, value)
			}
			for child in flat {
				element.append_child(child)
			}
			Node::Element(element)
		}
		Tag::Component(component) => {
			for (name, value) in attributes {
				component.set_attribute(name, value)
			}
			for child in flat {
				component.append_child(child)
			}
			Node::Composite(component)
		}
	}
}

/// Builds [`Props`] from `name => value` pairs, where each value is converted with [`Into<Prop>`].
#[macro_export]
macro_rules! props {
	($($name:expr => $value:expr),* $(,)?) => {{
		#[allow(unused_mut)]
		let mut props = $crate::Props::new();
		$(props.insert(::std::string::String::from($name), $crate::Prop::from($value));)*
		props
	}};
}

/// Builds a [`Vec<Child>`](`Child`) from heterogeneous items convertible into [`Child`].
#[macro_export]
macro_rules! children {
	($($child:expr),* $(,)?) => {
		::std::vec![$($crate::Child::from($child)),*]
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_element_flattens_and_wraps_children() {
		let node = create_element(
			"p",
			crate::props! { "id" => "greeting" },
			crate::children!["Hello", None::<Node>, vec![Node::from(", "), Element::new("b").with_child("world").into()], "!"],
		);

		let element = match node {
			Node::Element(element) => element,
			other => panic!("expected an element, got {:?}", other),
		};
		assert_eq!(element.tag(), "p");
		assert_eq!(element.props().get("id"), Some(&Prop::from("greeting")));
		assert_eq!(element.children().len(), 4);
		assert!(matches!(&element.children()[0], Node::Text(text) if text.content() == "Hello"));
		assert!(matches!(&element.children()[1], Node::Text(text) if text.content() == ", "));
		assert!(matches!(&element.children()[2], Node::Element(b) if b.tag() == "b"));
		assert!(matches!(&element.children()[3], Node::Text(text) if text.content() == "!"));
	}

	#[test]
	fn listeners_compare_by_identity() {
		let a = Listener::new(|_| ());
		let b = Listener::new(|_| ());
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
	}

	#[test]
	fn resolve_respects_depth_limit() {
		let tree: Node = Element::new("div").with_child(Element::new("span").with_child("deep")).into();
		assert!(tree.resolve(3).is_ok());
		assert_eq!(tree.resolve(2).unwrap_err(), Error::DepthLimit);
	}
}
