//! User-defined components and the update cycle they drive.

use crate::{
	diff,
	error::Error,
	host::{Host, RangeId},
	node::{Node, Prop, Props},
	state,
	vdom::VNode,
};
use core::fmt::{self, Debug, Formatter};
use serde_json::Value;
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::{instrument, trace, trace_span, warn};

/// A unit of UI logic whose [`render`](`Component::render`) yields another tree.
///
/// `render` must not call [`ComponentRef::set_state`] or [`ComponentRef::update`] on the component being rendered.
pub trait Component: 'static {
	fn render(&self, cx: &Context<'_>) -> Node;
}

/// What a [`Component`] can see while rendering.
pub struct Context<'a> {
	this: &'a ComponentRef,
	instance: &'a Instance,
}
impl<'a> Context<'a> {
	#[must_use]
	pub fn props(&self) -> &'a Props {
		&self.instance.props
	}

	#[must_use]
	pub fn prop(&self, name: &str) -> Option<&'a Prop> {
		self.instance.props.get(name)
	}

	/// The string value of the prop `name`, if it's set and not a listener.
	#[must_use]
	pub fn value(&self, name: &str) -> Option<&'a str> {
		match self.prop(name)? {
			Prop::Value(value) => Some(value),
			Prop::Listener(_) => None,
		}
	}

	#[must_use]
	pub fn children(&self) -> &'a [Node] {
		&self.instance.children
	}

	#[must_use]
	pub fn state(&self) -> Option<&'a Value> {
		self.instance.state.as_ref()
	}

	/// A weak handle to the component being rendered, e.g. for listeners that call [`ComponentRef::set_state`].
	#[must_use]
	pub fn this(&self) -> WeakComponentRef {
		self.this.downgrade()
	}
}

struct Mounted {
	vdom: VNode,
	depth_limit: usize,
}

struct Instance {
	component: Box<dyn Component>,
	props: Props,
	children: Vec<Node>,
	state: Option<Value>,
	mounted: Option<Mounted>,
}

/// A shared handle to a component instance, its props, children, state and (once mounted) its last resolved tree.
#[derive(Clone)]
pub struct ComponentRef(Rc<RefCell<Instance>>);
impl Debug for ComponentRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self.0.try_borrow() {
			Ok(instance) => f
				.debug_struct("ComponentRef")
				.field("props", &instance.props)
				.field("children.len()", &instance.children.len())
				.field("state", &instance.state)
				.field("range", &instance.mounted.as_ref().and_then(|mounted| mounted.vdom.range()))
				.finish(),
			Err(_) => f.debug_tuple("ComponentRef").field(&"<borrowed>").finish(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct WeakComponentRef(Weak<RefCell<Instance>>);
impl WeakComponentRef {
	#[must_use]
	pub fn upgrade(&self) -> Option<ComponentRef> {
		self.0.upgrade().map(ComponentRef)
	}
}

impl Debug for Instance {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance").field("props", &self.props).field("state", &self.state).finish_non_exhaustive()
	}
}

impl ComponentRef {
	pub fn new(component: impl Component) -> Self {
		Self(Rc::new(RefCell::new(Instance {
			component: Box::new(component),
			props: Props::new(),
			children: Vec::new(),
			state: None,
			mounted: None,
		})))
	}

	/// Creates a component with initial state.
	pub fn with_state(component: impl Component, state: Value) -> Self {
		let this = Self::new(component);
		this.0.borrow_mut().state = Some(state);
		this
	}

	#[must_use]
	pub fn downgrade(&self) -> WeakComponentRef {
		WeakComponentRef(Rc::downgrade(&self.0))
	}

	/// Sets a prop. Props are frozen once the component is mounted, so later calls are ignored.
	pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<Prop>) {
		let mut instance = self.0.borrow_mut();
		let name = name.into();
		if instance.mounted.is_some() {
			return warn!("Ignoring prop {:?} set on a mounted component.", name);
		}
		instance.props.insert(name, value.into());
	}

	pub fn append_child(&self, child: Node) {
		self.0.borrow_mut().children.push(child)
	}

	/// A copy of the current state.
	#[must_use]
	pub fn state(&self) -> Option<Value> {
		self.0.borrow().state.clone()
	}

	/// The range owned by the retained tree, if mounted.
	#[must_use]
	pub fn range(&self) -> Option<RangeId> {
		self.0.borrow().mounted.as_ref().and_then(|mounted| mounted.vdom.range())
	}

	/// Calls `f` with the retained resolved tree, if mounted.
	pub fn with_retained_tree<R>(&self, f: impl FnOnce(&VNode) -> R) -> Option<R> {
		self.0.borrow().mounted.as_ref().map(|mounted| f(&mounted.vdom))
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.0.borrow().mounted.is_some()
	}

	/// Calls [`Component::render`] once.
	pub(crate) fn render(&self) -> Node {
		let instance = self.0.borrow();
		let cx = Context { this: self, instance: &instance };
		let span = trace_span!("Rendering component", "props.len()" = instance.props.len(), "children.len()" = instance.children.len());
		let _enter = span.enter();
		instance.component.render(&cx)
	}

	/// Renders this component down to elements and text.
	///
	/// # Errors
	///
	/// Iff rendering nests deeper than `depth_limit`.
	pub fn resolve(&self, depth_limit: usize) -> Result<VNode, Error> {
		Node::Composite(self.clone()).resolve(depth_limit)
	}

	#[instrument(skip(host))]
	pub(crate) fn render_to_target<H: Host>(&self, host: &mut H, range: RangeId, depth_limit: usize) -> Result<(), Error> {
		let mut vdom = self.resolve(depth_limit)?;
		vdom.render_to_target(host, range)?;
		let previous = self.0.borrow_mut().mounted.replace(Mounted { vdom, depth_limit });
		if let Some(previous) = previous {
			trace!("Remounted; releasing the ranges of the previously retained tree.");
			diff::release(host, &previous.vdom);
		}
		Ok(())
	}

	/// Merges `partial` into the state, then [`update`](`ComponentRef::update`)s synchronously.
	///
	/// # Errors
	///
	/// See [`update`](`ComponentRef::update`). The state is merged regardless.
	#[instrument(skip(host))]
	pub fn set_state<H: Host>(&self, host: &mut H, partial: Value) -> Result<(), Error> {
		state::merge_state(&mut self.0.borrow_mut().state, partial);
		self.update(host)
	}

	/// Re-renders and patches the host to match, retaining the new tree for the next update.
	///
	/// # Errors
	///
	/// [`Error::Unmounted`] if this component was never mounted as the target of a render,
	/// and any error from rendering or the host.
	/// On error, the previously retained tree is kept.
	#[instrument(skip(host))]
	pub fn update<H: Host>(&self, host: &mut H) -> Result<(), Error> {
		let mounted = self.0.borrow_mut().mounted.take().ok_or_else(|| Error::Unmounted("component".to_owned()))?;

		let result = self.resolve(mounted.depth_limit).and_then(|mut vdom| {
			diff::update(host, &mounted.vdom, &mut vdom)?;
			Ok(vdom)
		});

		let mut instance = self.0.borrow_mut();
		match result {
			Ok(vdom) => {
				trace!("Retaining the new tree.");
				instance.mounted = Some(Mounted { vdom, ..mounted });
				Ok(())
			}
			Err(error) => {
				instance.mounted = Some(mounted);
				Err(error)
			}
		}
	}
}
