use ranged_dom::{memory::MemoryDocument, memory::NodeId, ComponentRef, Host, Node, DEFAULT_DEPTH_LIMIT};

pub fn init_logging() {
	// Fails harmlessly if another test in this binary was first.
	let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
}

/// A document with a `<div>` container attached to it.
pub fn document() -> (MemoryDocument, NodeId) {
	init_logging();
	let mut document = MemoryDocument::new();
	let container = document.create_element("div").unwrap();
	document.append_child(document.document(), container).unwrap();
	(document, container)
}

pub fn mount(component: &ComponentRef) -> (MemoryDocument, NodeId) {
	let (mut document, container) = document();
	ranged_dom::render(&mut document, &Node::from(component.clone()), &container, DEFAULT_DEPTH_LIMIT).unwrap();
	(document, container)
}
