#![cfg(target_arch = "wasm32")]

use ranged_dom::{serde_json::json, web::WebHost, Component, ComponentRef, Context, Element, Listener, Node, DEFAULT_DEPTH_LIMIT};
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

struct Clicker {
	host: Rc<RefCell<WebHost>>,
}
impl Component for Clicker {
	fn render(&self, cx: &Context<'_>) -> Node {
		let clicks = cx.state().and_then(|state| state["clicks"].as_u64()).unwrap_or(0);
		let this = cx.this();
		let host = Rc::clone(&self.host);
		Element::new("button")
			.with_prop("id", "test-button")
			.with_prop(
				"onClick",
				Listener::new(move |event| {
					assert_eq!(event.kind(), "click");
					if let Some(this) = this.upgrade() {
						this.set_state(&mut *host.borrow_mut(), json!({ "clicks": clicks + 1 })).unwrap()
					}
				}),
			)
			.with_child(clicks.to_string())
			.into()
	}
}

#[wasm_bindgen_test]
fn click() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	let document = window().unwrap().document().unwrap();
	let body = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	let host = Rc::new(RefCell::new(WebHost::new(document.clone())));

	let clicker = ComponentRef::new(Clicker { host: Rc::clone(&host) });
	ranged_dom::render(&mut *host.borrow_mut(), &clicker.clone().into(), body.as_ref(), DEFAULT_DEPTH_LIMIT).unwrap();
	assert_eq!(body.inner_html(), "<button id=\"test-button\">0</button>");

	let button: HtmlElement = document.get_element_by_id("test-button").unwrap().dyn_into().unwrap();
	button.click();
	assert_eq!(clicker.state(), Some(json!({ "clicks": 1 })));
	assert_eq!(body.inner_html(), "<button id=\"test-button\">1</button>");

	// The first button was replaced because its listener changed, and its listener was removed with it.
	assert!(!body.contains(Some(button.as_ref())));
	assert_eq!(host.borrow().listener_count(), 1);
	button.click();
	assert_eq!(clicker.state(), Some(json!({ "clicks": 1 })));

	let ranges = host.borrow().live_range_count();
	for expected in 2..=20 {
		let button: HtmlElement = document.get_element_by_id("test-button").unwrap().dyn_into().unwrap();
		button.click();
		assert_eq!(clicker.state(), Some(json!({ "clicks": expected })));
	}
	assert_eq!(host.borrow().live_range_count(), ranges);
	assert_eq!(host.borrow().listener_count(), 1);
}
