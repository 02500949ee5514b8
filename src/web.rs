#![cfg(target_arch = "wasm32")]

use std::sync::Arc;

use log::{error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use winit::dpi::LogicalSize;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::web::{EventLoopExtWebSys, WindowBuilderExtWebSys};
use winit::window::WindowBuilder;

use crate::app::{self, AppState};
use crate::{Demo, DemoKind, Renderer, Scene};

/// Starts a built-in demo on the canvas with the given id.
///
/// `demo` is `static` or `physics`; an empty string selects the physics demo.
#[wasm_bindgen]
pub async fn run(canvas_id: String, demo: String) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // A second call on the same page keeps the logger that is already installed.
    let _ = console_log::init_with_level(log::Level::Info);

    let kind = if demo.trim().is_empty() {
        DemoKind::Physics
    } else {
        demo.parse::<DemoKind>().map_err(js_error)?
    };
    let scene = Scene::builtin(kind).map_err(|err| js_error(format!("{err:#}")))?;
    for line in app::scene_listing(&scene) {
        info!("{line}");
    }
    let demo = Demo::from_scene(&scene).map_err(|err| js_error(format!("{err:#}")))?;

    let window = web_sys::window().ok_or_else(|| js_error("missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| js_error("missing document"))?;
    let canvas: web_sys::HtmlCanvasElement = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| js_error(format!("canvas `{canvas_id}` not found")))?
        .dyn_into()
        .map_err(|_| js_error(format!("element `{canvas_id}` is not a canvas")))?;

    let event_loop = EventLoop::new()
        .map_err(|err| js_error(format!("failed to create event loop: {err}")))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_canvas(Some(canvas))
            .with_prevent_default(true)
            .with_focusable(true)
            .with_title("Cube Arena")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| js_error(format!("window error: {err}")))?,
    );

    let renderer = Renderer::new(Arc::clone(&window), demo.background())
        .await
        .map_err(|err| js_error(format!("renderer error: {err:#}")))?;

    let mut app = AppState::new(renderer, demo);
    event_loop.spawn(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        if let Err(err) = app.process_event(&event, elwt) {
            error!("{err:#}");
            for line in app::run_summary(app.demo()) {
                info!("{line}");
            }
            elwt.exit();
        }
    });

    Ok(())
}

fn js_error(message: impl ToString) -> JsValue {
    JsValue::from_str(&message.to_string())
}
