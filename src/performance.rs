use crate::constants::LOCAL_HOSTS;
use crate::core::{format_thousands, heap_megabytes, FpsBand, FpsTracker};
use crate::dom;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

const OVERLAY_HTML: &str = "<div class=\"stats\">\
<div>FPS: <span id=\"fps\">0</span></div>\
<div>Memory: <span id=\"memory\">0</span> MB</div>\
<div>Triangles: <span id=\"triangles\">0</span></div>\
</div>";

/// On-screen FPS / heap / triangle readout.
pub struct PerformanceMonitor {
    root: web::HtmlElement,
    fps: Option<web::HtmlElement>,
    memory: Option<web::Element>,
    triangles: Option<web::Element>,
    tracker: FpsTracker,
    enabled: bool,
}

pub fn enabled_by_default(window: &web::Window) -> bool {
    window
        .location()
        .hostname()
        .map(|h| LOCAL_HOSTS.contains(&h.as_str()))
        .unwrap_or(false)
}

impl PerformanceMonitor {
    pub fn create(document: &web::Document, enabled: bool) -> Option<Self> {
        let root = dom::create_element(document, "div", "performance-monitor", OVERLAY_HTML)?;
        document.body()?.append_child(&root).ok()?;
        let find = |sel: &str| root.query_selector(sel).ok().flatten();
        let mut monitor = Self {
            fps: find("#fps").and_then(|e| e.dyn_into::<web::HtmlElement>().ok()),
            memory: find("#memory"),
            triangles: find("#triangles"),
            root,
            tracker: FpsTracker::new(),
            enabled: false,
        };
        if enabled {
            monitor.enable();
        } else {
            monitor.disable();
        }
        Some(monitor)
    }

    pub fn element(&self) -> &web::HtmlElement {
        &self.root
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.tracker.reset_clock();
        _ = self.root.set_attribute("style", "");
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        _ = self.root.set_attribute("style", "display:none");
    }

    pub fn toggle(&mut self) -> bool {
        if self.enabled {
            self.disable();
        } else {
            self.enable();
        }
        log::info!("[perf] overlay {}", if self.enabled { "on" } else { "off" });
        self.enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn update(&mut self, now_ms: f64, triangles: u64) {
        if !self.enabled {
            return;
        }
        if self.tracker.record(now_ms).is_none() {
            return;
        }
        if let (Some(el), Some(avg)) = (&self.fps, self.tracker.average()) {
            el.set_text_content(Some(&avg.to_string()));
            _ = el.style().set_property("color", FpsBand::of(avg).css_color());
        }
        if let (Some(el), Some(bytes)) = (&self.memory, used_heap_bytes()) {
            el.set_text_content(Some(&heap_megabytes(bytes).to_string()));
        }
        if let Some(el) = &self.triangles {
            el.set_text_content(Some(&format_thousands(triangles)));
        }
    }
}

/// `performance.memory.usedJSHeapSize`, a non-standard Chromium extension.
fn used_heap_bytes() -> Option<f64> {
    let perf = web::window()?.performance()?;
    let memory = js_sys::Reflect::get(&perf, &JsValue::from_str("memory")).ok()?;
    if memory.is_undefined() {
        return None;
    }
    js_sys::Reflect::get(&memory, &JsValue::from_str("usedJSHeapSize"))
        .ok()?
        .as_f64()
}

/// Run `f` between `performance.mark` calls and record a measure named `name`.
pub fn measure<T>(name: &str, f: impl FnOnce() -> T) -> T {
    let perf = web::window().and_then(|w| w.performance());
    let start = format!("{name}-start");
    let end = format!("{name}-end");
    if let Some(p) = &perf {
        _ = p.mark(&start);
    }
    let out = f();
    if let Some(p) = &perf {
        _ = p.mark(&end);
        _ = p.measure_with_start_mark_and_end_mark(name, &start, &end);
    }
    out
}
