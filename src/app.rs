use crate::audio::{self, AudioSystem};
use crate::constants::{ENVIRONMENT_SEED, PARTICLE_SEED, WEATHER_SEED};
use crate::core::model::load_glb;
use crate::core::{
    theme_by_key, CameraPreset, KeyValueStore, SceneSeeds, SceneState, Settings, Theme,
    DEFAULT_THEME, MODEL_OFFSET, MODEL_URL,
};
use crate::performance::{self, PerformanceMonitor};
use crate::render::GpuState;
use crate::{dom, frame, overlay, storage};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Optional capabilities, resolved once at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Components {
    pub gpu: bool,
    pub audio: bool,
    pub storage: bool,
    pub service_worker: bool,
}

/// Everything the page-side callbacks share. Held in an `Rc` and cloned into closures.
pub struct AppContext {
    pub window: web::Window,
    pub document: web::Document,
    pub canvas: web::HtmlCanvasElement,
    pub scene: RefCell<SceneState>,
    pub settings: RefCell<Settings>,
    pub theme: Cell<&'static Theme>,
    pub store: RefCell<Box<dyn KeyValueStore>>,
    pub audio: Option<Rc<RefCell<AudioSystem>>>,
    pub perf: RefCell<Option<PerformanceMonitor>>,
    pub gpu: RefCell<Option<GpuState<'static>>>,
    pub components: Components,
}

fn probe_service_worker(window: &web::Window) -> bool {
    js_sys::Reflect::has(&window.navigator(), &JsValue::from_str("serviceWorker")).unwrap_or(false)
}

pub async fn create(
    window: web::Window,
    document: web::Document,
    canvas: web::HtmlCanvasElement,
) -> anyhow::Result<Rc<AppContext>> {
    let settings = Settings::default();
    let dpr = dom::device_pixel_ratio();
    let (w, h) = dom::sync_canvas_backing_size(&canvas, settings.render_quality.pixel_ratio(dpr));
    let mut scene = SceneState::new(
        w,
        h,
        SceneSeeds {
            particles: PARTICLE_SEED,
            weather: WEATHER_SEED,
            environment: ENVIRONMENT_SEED,
        },
    );
    scene.apply_settings(&settings, dpr);

    let gpu = frame::init_gpu(&canvas, &scene).await;
    let audio = AudioSystem::new().map(|a| Rc::new(RefCell::new(a)));
    let components = Components {
        gpu: gpu.is_some(),
        audio: audio.is_some(),
        storage: matches!(window.local_storage(), Ok(Some(_))),
        service_worker: probe_service_worker(&window),
    };
    log::info!("[app] components {:?}", components);

    let store = storage::open_store(&window);
    let perf = PerformanceMonitor::create(&document, performance::enabled_by_default(&window));
    let theme = theme_by_key(DEFAULT_THEME).unwrap_or(&crate::core::THEMES[0]);

    let app = Rc::new(AppContext {
        window,
        document,
        canvas,
        scene: RefCell::new(scene),
        settings: RefCell::new(settings),
        theme: Cell::new(theme),
        store: RefCell::new(store),
        audio,
        perf: RefCell::new(perf),
        gpu: RefCell::new(gpu),
        components,
    });

    if let Some(audio) = &app.audio {
        audio::wire_resume_on_gesture(&app.document, audio.clone());
    }
    wire_header_buttons(&app);
    wire_canvas_resize(&app);
    if let Some(el) = app.perf.borrow().as_ref().map(|p| p.element().clone()) {
        let app_perf = app.clone();
        dom::add_listener(&el, "click", move |_| {
            app_perf.toggle_performance();
        });
    }
    Ok(app)
}

fn wire_header_buttons(app: &Rc<AppContext>) {
    for preset in CameraPreset::ALL {
        if let Some(id) = preset.button_id() {
            let app_view = app.clone();
            dom::add_click_listener(&app.document, id, move || {
                app_view.switch_view(preset.name());
            });
        }
    }
    let app_toggle = app.clone();
    dom::add_click_listener(&app.document, "toggle-btn", move || {
        app_toggle.toggle_auto_rotate();
    });
}

fn wire_canvas_resize(app: &Rc<AppContext>) {
    let app = app.clone();
    let window = app.window.clone();
    dom::add_listener(&window, "resize", move |_| {
        app.sync_canvas_size();
    });
}

impl AppContext {
    /// Fly to a camera preset and highlight its header button.
    pub fn switch_view(&self, name: &str) {
        let started = self.scene.borrow_mut().switch_view(name, dom::now_ms());
        if started.is_none() {
            return;
        }
        for preset in CameraPreset::ALL {
            let Some(id) = preset.button_id() else {
                continue;
            };
            if let Some(btn) = self.document.get_element_by_id(id) {
                _ = btn.class_list().toggle_with_force("active", preset.name() == name);
            }
        }
        self.set_rotate_button(false);
        log::info!("[camera] switching to '{name}'");
    }

    pub fn toggle_auto_rotate(&self) -> bool {
        let on = self.scene.borrow_mut().toggle_auto_rotate();
        self.set_rotate_button(on);
        on
    }

    fn set_rotate_button(&self, on: bool) {
        if let Some(btn) = self.document.get_element_by_id("toggle-btn") {
            btn.set_text_content(Some(if on { "Stop Rotation" } else { "Start Rotation" }));
            _ = btn.class_list().toggle_with_force("active", on);
        }
    }

    pub fn toggle_performance(&self) -> bool {
        self.perf
            .borrow_mut()
            .as_mut()
            .map_or(false, PerformanceMonitor::toggle)
    }

    /// Push the current settings into every subsystem.
    pub fn apply_settings(&self) {
        let settings = self.settings.borrow();
        self.scene
            .borrow_mut()
            .apply_settings(&settings, dom::device_pixel_ratio());
        drop(settings);
        self.sync_canvas_size();
    }

    /// Match the canvas backing store to its CSS size at the current quality.
    pub fn sync_canvas_size(&self) {
        let ratio = self.scene.borrow().pixel_ratio;
        let (w, h) = dom::sync_canvas_backing_size(&self.canvas, ratio);
        let changed = self.scene.borrow().post.size() != (w, h);
        if changed {
            self.scene.borrow_mut().resize(w, h);
            if let Some(gpu) = self.gpu.borrow_mut().as_mut() {
                gpu.resize_if_needed(w, h);
            }
        }
    }

    /// Draw one frame outside the loop, e.g. right before a canvas capture.
    pub fn render_now(&self) {
        let mut gpu = self.gpu.borrow_mut();
        let Some(gpu) = gpu.as_mut() else {
            return;
        };
        if let Err(e) = gpu.render(&mut self.scene.borrow_mut()) {
            log::warn!("[render] frame skipped: {:?}", e);
        }
    }

    /// Fetch, parse and upload the head model. Failures leave the scene empty.
    pub async fn load_model(self: Rc<Self>) {
        overlay::set_progress(&self.document, 0);
        let result = match fetch_with_progress(&self.window, &self.document, MODEL_URL).await {
            Ok(bytes) => load_glb(&bytes, MODEL_OFFSET).map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(mesh) => {
                log::info!(
                    "[model] loaded {} ({} triangles)",
                    MODEL_URL,
                    mesh.triangle_count()
                );
                if let Some((lo, hi)) = mesh.bounds() {
                    log::info!("[model] bounds {lo} .. {hi}");
                }
                if let Some(gpu) = self.gpu.borrow_mut().as_mut() {
                    gpu.set_mesh(&mesh);
                }
                self.scene.borrow_mut().set_mesh(mesh);
                overlay::set_progress(&self.document, 100);
            }
            Err(e) => {
                log::error!("[model] {}: {:?}", MODEL_URL, e);
                overlay::show_error(&self.document, "Failed to load 3D model. Please refresh the page.");
            }
        }
        overlay::hide_loading(&self.document);
    }
}

/// Read a response body chunk by chunk, reporting percent of `content-length`.
async fn fetch_with_progress(
    window: &web::Window,
    document: &web::Document,
    url: &str,
) -> anyhow::Result<Vec<u8>> {
    let resp_value = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    let resp: web::Response = resp_value
        .dyn_into()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    if !resp.ok() {
        anyhow::bail!("HTTP {} for {}", resp.status(), url);
    }
    let total = resp
        .headers()
        .get("content-length")
        .ok()
        .flatten()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let Some(body) = resp.body() else {
        let buf = JsFuture::from(resp.array_buffer().map_err(|e| anyhow::anyhow!("{:?}", e))?)
            .await
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        return Ok(js_sys::Uint8Array::new(&buf).to_vec());
    };
    let reader: web::ReadableStreamDefaultReader = body.get_reader().unchecked_into();
    let mut bytes = Vec::new();
    loop {
        let chunk = JsFuture::from(reader.read())
            .await
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let done = js_sys::Reflect::get(&chunk, &JsValue::from_str("done"))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        if done {
            break;
        }
        let value = js_sys::Reflect::get(&chunk, &JsValue::from_str("value"))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let part = js_sys::Uint8Array::new(&value);
        let start = bytes.len();
        bytes.resize(start + part.length() as usize, 0);
        part.copy_to(&mut bytes[start..]);
        if total > 0.0 {
            overlay::set_progress(document, (bytes.len() as f64 / total * 100.0) as u32);
        }
    }
    Ok(bytes)
}
