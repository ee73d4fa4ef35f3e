use crate::app::AppContext;
use crate::core::SceneState;
use crate::{dom, performance, render};
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct FrameContext {
    pub app: Rc<AppContext>,
    pub last_instant: Instant,
}

impl FrameContext {
    pub fn new(app: Rc<AppContext>) -> Self {
        Self {
            app,
            last_instant: Instant::now(),
        }
    }

    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt = now - self.last_instant;
        self.last_instant = now;
        let dt_ms = dt.as_secs_f32() * 1000.0;
        let now_ms = dom::now_ms();
        let app = &self.app;

        let mut scene = app.scene.borrow_mut();
        scene.step_camera(now_ms);
        let fired = scene.tick(now_ms, dt_ms);

        if let Some(audio) = &app.audio {
            let audio = audio.borrow();
            for i in fired {
                let trigger = &scene.triggers.triggers[i];
                audio.play_tone(trigger.position, &trigger.tone);
            }
            let cam = &scene.camera;
            audio.update_listener(cam.eye, cam.forward(), cam.up);
        }

        if let Some(perf) = app.perf.borrow_mut().as_mut() {
            perf.update(now_ms, scene.triangle_count());
        }

        let mut gpu = app.gpu.borrow_mut();
        if let Some(gpu) = gpu.as_mut() {
            gpu.resize_if_needed(app.canvas.width(), app.canvas.height());
            let result = performance::measure("frame-render", || gpu.render(&mut scene));
            match result {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    log::warn!("[render] surface lost, reconfiguring next frame");
                }
                Err(e) => log::error!("[render] {:?}", e),
            }
        }
    }
}

pub async fn init_gpu(
    canvas: &web::HtmlCanvasElement,
    scene: &SceneState,
) -> Option<render::GpuState<'static>> {
    // leak a canvas clone to satisfy 'static lifetime for surface
    let leaked_canvas = Box::leak(Box::new(canvas.clone()));
    match render::GpuState::new(leaked_canvas, scene).await {
        Ok(g) => Some(g),
        Err(e) => {
            log::info!("[render] WebGPU unavailable: {:?}", e);
            None
        }
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let frame_ctx_tick = frame_ctx.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx_tick.borrow_mut().frame();
        if let (Some(w), Some(cb)) = (web::window(), tick_clone.borrow().as_ref()) {
            _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut()>));
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    };
}
