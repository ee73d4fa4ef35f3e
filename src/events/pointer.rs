use crate::app::AppContext;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Last pointer position while a drag is in progress.
#[derive(Clone, Copy, Debug, Default)]
struct DragState {
    active: bool,
    x: f32,
    y: f32,
}

/// Drag to orbit, wheel to dolly. Both act on the orbit controller, so they
/// do nothing while a camera transition owns the view.
pub fn wire_orbit_input(app: Rc<AppContext>) {
    let drag = Rc::new(Cell::new(DragState::default()));
    wire_pointerdown(&app, &drag);
    wire_pointermove(&app, &drag);
    wire_pointerup(&app, &drag);
    wire_wheel(&app);
}

fn wire_pointerdown(app: &Rc<AppContext>, drag: &Rc<Cell<DragState>>) {
    let canvas = app.canvas.clone();
    let drag = drag.clone();
    let closure = wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        drag.set(DragState {
            active: true,
            x: ev.client_x() as f32,
            y: ev.client_y() as f32,
        });
        _ = canvas.set_pointer_capture(ev.pointer_id());
    }) as Box<dyn FnMut(_)>);
    _ = app
        .canvas
        .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn wire_pointermove(app: &Rc<AppContext>, drag: &Rc<Cell<DragState>>) {
    let app_move = app.clone();
    let drag = drag.clone();
    let closure = wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        let state = drag.get();
        if !state.active {
            return;
        }
        let (x, y) = (ev.client_x() as f32, ev.client_y() as f32);
        let height = app_move.canvas.client_height() as f32;
        app_move
            .scene
            .borrow_mut()
            .drag(x - state.x, y - state.y, height);
        drag.set(DragState { active: true, x, y });
    }) as Box<dyn FnMut(_)>);
    _ = app
        .canvas
        .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn wire_pointerup(app: &Rc<AppContext>, drag: &Rc<Cell<DragState>>) {
    let canvas = app.canvas.clone();
    let drag = drag.clone();
    let closure = wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        drag.set(DragState::default());
        _ = canvas.release_pointer_capture(ev.pointer_id());
    }) as Box<dyn FnMut(_)>);
    for event in ["pointerup", "pointercancel"] {
        _ = app
            .canvas
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    }
    closure.forget();
}

fn wire_wheel(app: &Rc<AppContext>) {
    let app_wheel = app.clone();
    let closure = wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web::WheelEvent| {
        app_wheel.scene.borrow_mut().wheel(ev.delta_y() as f32);
        ev.prevent_default();
    }) as Box<dyn FnMut(_)>);
    _ = app
        .canvas
        .add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref());
    closure.forget();
}
