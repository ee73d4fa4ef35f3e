use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

#[inline]
pub fn add_click_listener(
    document: &web::Document,
    element_id: &str,
    mut handler: impl FnMut() + 'static,
) {
    if let Some(el) = document.get_element_by_id(element_id) {
        let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
        _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

/// Attach `handler` for `event` on `target`; the closure lives for the page.
pub fn add_listener(
    target: &web::EventTarget,
    event: &str,
    mut handler: impl FnMut(web::Event) + 'static,
) {
    let closure = Closure::wrap(Box::new(move |ev: web::Event| handler(ev)) as Box<dyn FnMut(_)>);
    _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure.forget();
}

/// One-shot timer. Returns the handle, or `None` without a window.
pub fn set_timeout(handler: impl FnOnce() + 'static, ms: i32) -> Option<i32> {
    let window = web::window()?;
    let closure = Closure::once(handler);
    let id = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            ms,
        )
        .ok();
    closure.forget();
    id
}

pub fn element_by_id<T: JsCast>(document: &web::Document, id: &str) -> Option<T> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
}

pub fn set_text(document: &web::Document, id: &str, text: &str) {
    if let Some(el) = document.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

/// Create `<tag class=..>` with the given inner HTML.
pub fn create_element(
    document: &web::Document,
    tag: &str,
    class: &str,
    inner_html: &str,
) -> Option<web::HtmlElement> {
    let el = document.create_element(tag).ok()?;
    if !class.is_empty() {
        el.set_class_name(class);
    }
    el.set_inner_html(inner_html);
    el.dyn_into::<web::HtmlElement>().ok()
}

pub fn input_value(document: &web::Document, id: &str) -> Option<String> {
    element_by_id::<web::HtmlInputElement>(document, id).map(|i| i.value())
}

pub fn select_value(document: &web::Document, id: &str) -> Option<String> {
    element_by_id::<web::HtmlSelectElement>(document, id).map(|s| s.value())
}

/// Size the canvas backing store to CSS size × `pixel_ratio`; returns the new size.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement, pixel_ratio: f64) -> (u32, u32) {
    let rect = canvas.get_bounding_client_rect();
    let w_px = ((rect.width() * pixel_ratio) as u32).max(1);
    let h_px = ((rect.height() * pixel_ratio) as u32).max(1);
    if canvas.width() != w_px || canvas.height() != h_px {
        canvas.set_width(w_px);
        canvas.set_height(h_px);
    }
    (w_px, h_px)
}

pub fn device_pixel_ratio() -> f64 {
    web::window().map_or(1.0, |w| w.device_pixel_ratio())
}

pub fn now_ms() -> f64 {
    web::window()
        .and_then(|w| w.performance())
        .map_or(0.0, |p| p.now())
}
