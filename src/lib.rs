#![cfg(target_arch = "wasm32")]
use crate::core::cache::ClientMessage;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

mod app;
mod audio;
mod constants;
mod core;
mod dom;
mod events;
mod frame;
mod overlay;
mod performance;
mod render;
mod storage;
mod sw;
mod ui;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();

    // The same module is loaded by the service worker, which has no window.
    if web::window().is_none() {
        log::info!("[sw] wasm module ready");
        return Ok(());
    }
    log::info!("head-web starting");
    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
            if let Some(doc) = dom::window_document() {
                overlay::show_error(&doc, "Failed to initialize the application.");
            }
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id("app-canvas")
        .ok_or_else(|| anyhow::anyhow!("missing #app-canvas"))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let app = app::create(window, document, canvas).await?;

    ui::build(&app);
    events::wire_global_keydown(app.clone());
    events::wire_orbit_input(app.clone());
    if app.components.service_worker {
        spawn_local(register_service_worker(app.clone()));
    }
    spawn_local(app.clone().load_model());

    let frame_ctx = Rc::new(RefCell::new(frame::FrameContext::new(app)));
    frame::start_loop(frame_ctx);
    Ok(())
}

async fn register_service_worker(app: Rc<app::AppContext>) {
    let container = app.window.navigator().service_worker();
    match JsFuture::from(container.register("/sw.js")).await {
        Ok(_) => log::info!("[sw] registered"),
        Err(e) => {
            log::warn!("[sw] registration failed: {:?}", e);
            return;
        }
    }
    let document = app.document.clone();
    dom::add_listener(&container, "message", move |ev| {
        let Ok(msg) = ev.dyn_into::<web::MessageEvent>() else {
            return;
        };
        let Some(json) = js_sys::JSON::stringify(&msg.data())
            .ok()
            .and_then(|s| s.as_string())
        else {
            return;
        };
        match serde_json::from_str::<ClientMessage>(&json) {
            Ok(ClientMessage::AssetCached { url, size }) => {
                log::info!("[sw] cached {url} ({} bytes)", size.unwrap_or(0));
            }
            Ok(ClientMessage::ResourcesUpdated) => {
                ui::notify(&document, "App updated in the background", ui::NoticeKind::Info);
            }
            Ok(other) => log::info!("[sw] {:?}", other),
            Err(e) => log::info!("[sw] unrecognised worker message: {e}"),
        }
    });
}
