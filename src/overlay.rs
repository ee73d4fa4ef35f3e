use crate::core::ERROR_BANNER_MS;
use crate::dom;
use web_sys as web;

#[inline]
pub fn set_progress(document: &web::Document, percent: u32) {
    let percent = percent.min(100);
    if let Some(bar) = dom::element_by_id::<web::HtmlElement>(document, "loading-progress") {
        _ = bar.style().set_property("width", &format!("{}%", percent));
    }
    dom::set_text(document, "loading-text", &format!("Loading... {}%", percent));
}

#[inline]
pub fn hide_loading(document: &web::Document) {
    if let Some(el) = document.get_element_by_id("loading-indicator") {
        _ = el.set_attribute("style", "display:none");
    }
}

/// Show a timed `.error-message` banner.
pub fn show_error(document: &web::Document, message: &str) {
    let Some(banner) = dom::create_element(document, "div", "error-message", "") else {
        return;
    };
    banner.set_text_content(Some(message));
    let Some(body) = document.body() else {
        return;
    };
    _ = body.append_child(&banner);
    dom::set_timeout(move || banner.remove(), ERROR_BANNER_MS);
}
