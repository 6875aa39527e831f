//! Leptos component wrapping the neighborhood graph canvas.
//!
//! The component creates an HTML canvas element and wires up mouse/wheel event
//! handlers for node dragging, clicking, panning, and zooming. An animation
//! loop runs via `requestAnimationFrame`, advancing the layout and camera and
//! redrawing each frame. Reactive props are forwarded into
//! [`ForceGraphState`] by one effect each.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;
use super::theme::Theme;
use super::types::RawGraph;

/// Longest frame delta fed to the layout, so a backgrounded tab does not
/// spend its whole time budget in one step.
const MAX_FRAME_MS: f64 = 100.0;

/// Graph state plus what the animation loop needs to draw it.
struct GraphContext {
	state: ForceGraphState,
	theme: Theme,
	ctx: CanvasRenderingContext2d,
	last_frame: Option<f64>,
}

/// Renders an interactive neighborhood graph on a canvas element.
///
/// `data` is `None` until the neighborhood has loaded. The component sizes
/// itself to its parent container by default; set `fullscreen = true` to fill
/// the viewport and resize automatically with the window. Explicit
/// `width`/`height` override automatic sizing.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<Option<Arc<RawGraph>>>,
	#[prop(into)] repulsion: Signal<f64>,
	#[prop(into)] show_labels: Signal<bool>,
	#[prop(into)] entity_only: Signal<bool>,
	#[prop(optional)] theme: Option<Theme>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<GraphContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));
	let (context_init, animate_init, alive_init) =
		(context.clone(), animate.clone(), alive.clone());
	let theme = theme.unwrap_or_default();

	on_cleanup({
		let alive = alive.clone();
		move || alive.store(false, Ordering::Relaxed)
	});

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			viewport_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("kg-viz: canvas has no 2d context");
			return;
		};

		let mut state = ForceGraphState::new(
			w,
			h,
			repulsion.get_untracked(),
			show_labels.get_untracked(),
			entity_only.get_untracked(),
		);
		if let Some(raw) = data.get_untracked() {
			state.load(raw);
		}
		info!("kg-viz: canvas ready at {}x{}", w, h);

		*context_init.borrow_mut() = Some(GraphContext {
			state,
			theme: theme.clone(),
			ctx,
			last_frame: None,
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			let listener = window_event_listener(leptos::ev::resize, move |_| {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = viewport_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.state.resize(nw, nh);
				}
			});
			on_cleanup(move || listener.remove());
		}

		let (context_anim, animate_inner, alive_anim) =
			(context_init.clone(), animate_init.clone(), alive_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			if !alive_anim.load(Ordering::Relaxed) {
				return;
			}
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				let dt = c
					.last_frame
					.map_or(16.0, |last| (now - last).clamp(0.0, MAX_FRAME_MS));
				c.last_frame = Some(now);
				c.state.frame(dt);
				render::render(&c.state, &mut c.ctx, &c.state.scale, &c.theme);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_data = context.clone();
	Effect::new(move |_| {
		let graph = data.get();
		if let (Some(raw), Some(c)) = (graph, context_data.borrow_mut().as_mut()) {
			c.state.load(raw);
		}
	});

	let context_rep = context.clone();
	Effect::new(move |_| {
		let value = repulsion.get();
		if let Some(ref mut c) = *context_rep.borrow_mut() {
			c.state.set_repulsion(value);
		}
	});

	let context_labels = context.clone();
	Effect::new(move |_| {
		let show = show_labels.get();
		if let Some(ref mut c) = *context_labels.borrow_mut() {
			c.state.set_show_labels(show);
		}
	});

	let context_filter = context.clone();
	Effect::new(move |_| {
		let only = entity_only.get();
		if let Some(ref mut c) = *context_filter.borrow_mut() {
			c.state.set_entity_only(only);
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_md.borrow_mut() {
			c.state.pointer_down(x, y);
		}
		set_cursor(canvas_ref, "grabbing");
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		let cursor = match *context_mm.borrow_mut() {
			Some(ref mut c) => {
				c.state.pointer_move(x, y);
				if c.state.drag.node_id.is_some() || c.state.pan.active {
					"grabbing"
				} else if c.state.node_at_position(x, y).is_some() {
					"pointer"
				} else {
					"grab"
				}
			}
			None => "grab",
		};
		set_cursor(canvas_ref, cursor);
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_mu.borrow_mut() {
			c.state.pointer_up();
		}
		set_cursor(canvas_ref, "grab");
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.state.pointer_cancel();
		}
		set_cursor(canvas_ref, "grab");
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			c.state.wheel(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

fn viewport_size(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback| v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback);
	(dim(window.inner_width(), 800.0), dim(window.inner_height(), 600.0))
}

/// Event position relative to the canvas' top-left corner.
fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn set_cursor(canvas_ref: NodeRef<leptos::html::Canvas>, cursor: &str) {
	if let Some(canvas) = canvas_ref.get_untracked() {
		let canvas: HtmlCanvasElement = canvas.into();
		let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
	}
}
