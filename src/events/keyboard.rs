use crate::app::AppContext;
use crate::core::{action_for_key, KeyAction};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Typing into a settings control must not move the camera.
fn is_form_target(ev: &web::KeyboardEvent) -> bool {
    ev.target()
        .and_then(|t| t.dyn_into::<web::Element>().ok())
        .map(|el| matches!(el.tag_name().as_str(), "INPUT" | "SELECT" | "TEXTAREA"))
        .unwrap_or(false)
}

pub fn handle_global_keydown(ev: &web::KeyboardEvent, app: &AppContext) {
    if is_form_target(ev) {
        return;
    }
    let Some(action) = action_for_key(&ev.code(), ev.ctrl_key()) else {
        return;
    };
    match action {
        KeyAction::ToggleAutoRotate => {
            let on = app.toggle_auto_rotate();
            log::info!("[keys] auto-rotate={}", on);
        }
        KeyAction::SwitchView(preset) => app.switch_view(preset.name()),
        KeyAction::TogglePerformance => {
            app.toggle_performance();
        }
    }
    ev.prevent_default();
}

pub fn wire_global_keydown(app: Rc<AppContext>) {
    if let Some(window) = web::window() {
        let closure =
            wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
                handle_global_keydown(&ev, &app);
            }) as Box<dyn FnMut(_)>);
        _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}
