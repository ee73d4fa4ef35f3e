//! Settings panel, camera minimap, quick actions and notifications.
//!
//! Every control writes the shared [`Settings`] and applies its effect
//! immediately; saving is explicit.

use crate::app::AppContext;
use crate::core::{
    load_settings, save_settings, theme_by_key, CameraPreset, EffectParam, PostEffect,
    RenderQuality, Settings,
    NOTIFICATION_MS, SETTINGS_LOAD_DELAY_MS, SHORTCUT_HELP, THEMES,
};
use crate::dom;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

static UI_CSS: &str = include_str!("../css/ui.css");

const QUALITIES: [RenderQuality; 4] = [
    RenderQuality::Low,
    RenderQuality::Medium,
    RenderQuality::High,
    RenderQuality::Ultra,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    fn class(self) -> &'static str {
        match self {
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        }
    }
}

/// `floatingParticles` → `Floating Particles`.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

fn range_html(id: &str, label: &str, max: u32, value: u32) -> String {
    format!(
        "<div class=\"setting-group\"><label>{label}</label>\
         <input type=\"range\" id=\"{id}\" min=\"0\" max=\"{max}\" value=\"{value}\"></div>"
    )
}

fn options_html(values: &[&str], selected: &str) -> String {
    values
        .iter()
        .map(|v| {
            let sel = if *v == selected { " selected" } else { "" };
            format!("<option value=\"{v}\"{sel}>{}</option>", title_case(v))
        })
        .collect()
}

fn checkbox_html(id: &str, attrs: &str, label: &str, checked: bool) -> String {
    let checked = if checked { " checked" } else { "" };
    format!(
        "<div class=\"setting-group\"><label class=\"checkbox-label\">\
         <input type=\"checkbox\" id=\"{id}\"{attrs}{checked}>{label}</label></div>"
    )
}

fn settings_panel_html(app: &AppContext) -> String {
    let settings = app.settings.borrow();
    let scene = app.scene.borrow();
    let qualities: Vec<&str> = QUALITIES.iter().map(|q| q.name()).collect();
    let themes: String = THEMES
        .iter()
        .map(|t| {
            let active = if t.key == app.theme.get().key { " active" } else { "" };
            format!(
                "<div class=\"theme-option{active}\" data-theme=\"{key}\">\
                 <div class=\"theme-preview {key}-theme\"></div><span>{name}</span></div>",
                key = t.key,
                name = t.name
            )
        })
        .collect();
    let ambience = match &app.audio {
        Some(audio) => {
            let audio = audio.borrow();
            format!(
                "<div class=\"setting-group\"><label>Ambience</label>\
                 <select id=\"ambience-select\">{}</select></div>\
                 {}\
                 <div class=\"setting-group\"><label>Ambience Volume</label>\
                 <input type=\"range\" id=\"ambience-volume\" min=\"0\" max=\"100\" value=\"100\"></div>",
                options_html(&audio.available_ambiences(), audio.current_ambience()),
                checkbox_html("ambience-enabled", "", "Ambient Sound", audio.is_enabled()),
            )
        }
        None => String::new(),
    };
    let effects: String = PostEffect::ALL
        .iter()
        .map(|e| {
            checkbox_html(
                &format!("effect-{}", e.name()),
                &format!(" data-effect=\"{}\"", e.name()),
                &title_case(e.name()),
                scene.post.flags.get(*e),
            )
        })
        .collect();
    let strengths: String = EffectParam::ALL
        .iter()
        .map(|p| {
            range_html(
                p.element_id(),
                p.label(),
                p.slider_max(),
                p.to_slider(scene.post.param(*p)),
            )
        })
        .collect();
    let systems: String = scene
        .particles
        .systems
        .iter()
        .map(|s| {
            let name = s.kind.name();
            let title = title_case(name);
            format!(
                "{}{}",
                checkbox_html(&format!("system-{name}"), "", &title, s.visible),
                range_html(
                    &format!("system-{name}-intensity"),
                    &format!("{title} Intensity"),
                    100,
                    (s.intensity * 100.0).round().max(0.0) as u32,
                ),
            )
        })
        .collect();
    let perf_on = app
        .perf
        .borrow()
        .as_ref()
        .map_or(false, |p| p.is_enabled());

    format!(
        "<div class=\"settings-header\"><h3>Advanced Settings</h3>\
         <button id=\"close-settings\" class=\"close-btn\">&times;</button></div>\
         <div class=\"settings-content\">\
         <div class=\"setting-group\"><label>Render Quality</label>\
         <select id=\"render-quality\">{quality}</select></div>\
         <div class=\"setting-group\"><label>Theme</label>\
         <div class=\"theme-selector\">{themes}</div></div>\
         <div class=\"setting-group\"><label>Environment</label>\
         <select id=\"environment-select\">{envs}</select></div>\
         <div class=\"setting-group\"><label>Weather</label>\
         <select id=\"weather-select\">{weather}</select></div>\
         {ambience}\
         <div class=\"setting-group\"><label>Particle Intensity: \
         <span id=\"particle-value\">{particle_label}</span></label>\
         <input type=\"range\" id=\"particle-intensity\" min=\"0\" max=\"100\" value=\"{particle}\"></div>\
         <div class=\"setting-group\"><label>Auto-Rotation Speed: \
         <span id=\"rotation-value\">{rotation_label}</span></label>\
         <input type=\"range\" id=\"rotation-speed\" min=\"0\" max=\"3\" step=\"0.1\" value=\"{rotation}\"></div>\
         {post}{effects}{strengths}{systems}{perf}\
         <div class=\"settings-actions\">\
         <button id=\"reset-settings\" class=\"btn secondary\">Reset to Defaults</button>\
         <button id=\"save-settings\" class=\"btn primary\">Save Settings</button></div>\
         </div>",
        quality = options_html(&qualities, settings.render_quality.name()),
        envs = options_html(
            &scene.environment.available_environments(),
            &settings.environment_lighting
        ),
        weather = options_html(&scene.weather.available_weather(), &settings.weather),
        particle_label = settings.particle_label(),
        particle = settings.particle_slider_value(),
        rotation_label = settings.rotation_label(),
        rotation = settings.auto_rotate_speed,
        post = checkbox_html(
            "post-processing",
            "",
            "Post-Processing Effects",
            settings.post_processing
        ),
        perf = checkbox_html("performance-stats", "", "Performance Statistics", perf_on),
    )
}

fn minimap_html() -> String {
    let tiles: String = CameraPreset::ALL
        .iter()
        .map(|p| {
            format!(
                "<div class=\"camera-preset\" data-preset=\"{}\"><span>{}</span></div>",
                p.name(),
                p.label()
            )
        })
        .collect();
    format!(
        "<div class=\"mini-map-header\"><span>Camera Views</span></div>\
         <div class=\"mini-map-content\">{tiles}</div>"
    )
}

const QUICK_ACTIONS_HTML: &str = "\
<button id=\"settings-btn\" class=\"quick-action-btn\" title=\"Settings\">&#9881;</button>\
<button id=\"screenshot-btn\" class=\"quick-action-btn\" title=\"Screenshot\">&#128247;</button>\
<button id=\"fullscreen-btn\" class=\"quick-action-btn\" title=\"Fullscreen\">&#9974;</button>\
<button id=\"help-btn\" class=\"quick-action-btn\" title=\"Help\">?</button>";

fn append_block(document: &web::Document, id: &str, class: &str, html: &str) -> Option<web::HtmlElement> {
    let el = dom::create_element(document, "div", class, html)?;
    el.set_id(id);
    document.body()?.append_child(&el).ok()?;
    Some(el)
}

fn for_each_element(document: &web::Document, selector: &str, mut f: impl FnMut(web::Element)) {
    let Ok(list) = document.query_selector_all(selector) else {
        return;
    };
    for i in 0..list.length() {
        if let Some(el) = list.item(i).and_then(|n| n.dyn_into::<web::Element>().ok()) {
            f(el);
        }
    }
}

fn on(app: &Rc<AppContext>, id: &str, event: &str, mut handler: impl FnMut(&AppContext) + 'static) {
    if let Some(el) = app.document.get_element_by_id(id) {
        let app = app.clone();
        dom::add_listener(&el, event, move |_| handler(&app));
    }
}

fn checkbox_checked(document: &web::Document, id: &str) -> Option<bool> {
    dom::element_by_id::<web::HtmlInputElement>(document, id).map(|i| i.checked())
}

/// Transient `.notification` node, removed after a few seconds.
pub fn notify(document: &web::Document, message: &str, kind: NoticeKind) {
    let Some(tray) = document.get_element_by_id("notifications") else {
        return;
    };
    let Some(note) = dom::create_element(document, "div", &format!("notification {}", kind.class()), "")
    else {
        return;
    };
    note.set_text_content(Some(message));
    _ = tray.append_child(&note);
    dom::set_timeout(move || note.remove(), NOTIFICATION_MS);
}

/// Build every UI block, wire its handlers and schedule the settings load.
pub fn build(app: &Rc<AppContext>) {
    let document = &app.document;
    if document.get_element_by_id("theme-styles").is_none() {
        if let (Ok(style), Some(head)) = (document.create_element("style"), document.head()) {
            style.set_id("theme-styles");
            style.set_text_content(Some(UI_CSS));
            _ = head.append_child(&style);
        }
    }
    append_block(document, "settings-panel", "settings-panel", &settings_panel_html(app));
    append_block(document, "mini-map", "mini-map", &minimap_html());
    append_block(document, "quick-actions", "quick-actions", QUICK_ACTIONS_HTML);
    append_block(document, "notifications", "notifications", "");

    wire_panel(app);
    wire_minimap(app);
    wire_quick_actions(app);

    let app_load = app.clone();
    dom::set_timeout(move || load(&app_load), SETTINGS_LOAD_DELAY_MS);
}

fn wire_panel(app: &Rc<AppContext>) {
    on(app, "close-settings", "click", |app| set_panel_open(app, false));

    for_each_element(&app.document, ".theme-option", |el| {
        let Some(key) = el.get_attribute("data-theme") else {
            return;
        };
        let app = app.clone();
        dom::add_listener(&el, "click", move |_| {
            switch_theme(&app, &key);
        });
    });

    on(app, "render-quality", "change", |app| {
        let Some(quality) = dom::select_value(&app.document, "render-quality")
            .and_then(|v| RenderQuality::from_name(&v))
        else {
            return;
        };
        app.settings.borrow_mut().render_quality = quality;
        app.apply_settings();
    });

    on(app, "environment-select", "change", |app| {
        let Some(name) = dom::select_value(&app.document, "environment-select") else {
            return;
        };
        if app.scene.borrow_mut().apply_environment(&name) {
            app.settings.borrow_mut().environment_lighting = name;
        }
    });

    on(app, "weather-select", "change", |app| {
        let Some(name) = dom::select_value(&app.document, "weather-select") else {
            return;
        };
        app.scene.borrow_mut().weather.set_weather(&name);
        app.settings.borrow_mut().weather = name;
    });

    on(app, "ambience-select", "change", |app| {
        if let (Some(audio), Some(name)) = (&app.audio, dom::select_value(&app.document, "ambience-select")) {
            audio.borrow_mut().set_ambience(&name);
        }
    });

    on(app, "ambience-enabled", "change", |app| {
        let (Some(audio), Some(on)) = (&app.audio, checkbox_checked(&app.document, "ambience-enabled")) else {
            return;
        };
        let mut audio = audio.borrow_mut();
        if audio.is_enabled() != on {
            audio.toggle();
        }
    });

    on(app, "ambience-volume", "input", |app| {
        let (Some(audio), Some(v)) = (
            &app.audio,
            dom::input_value(&app.document, "ambience-volume").and_then(|v| v.parse::<f32>().ok()),
        ) else {
            return;
        };
        audio.borrow_mut().set_master_volume(v / 100.0);
    });

    on(app, "particle-intensity", "input", |app| {
        let Some(v) = dom::input_value(&app.document, "particle-intensity")
            .and_then(|v| v.parse::<f64>().ok())
        else {
            return;
        };
        let mut settings = app.settings.borrow_mut();
        settings.set_particle_from_slider(v);
        dom::set_text(&app.document, "particle-value", &settings.particle_label());
        app.scene
            .borrow_mut()
            .particles
            .set_all_intensity(settings.particle_intensity);
        drop(settings);
        sync_system_controls(app);
    });

    on(app, "rotation-speed", "input", |app| {
        let Some(v) = dom::input_value(&app.document, "rotation-speed")
            .and_then(|v| v.parse::<f32>().ok())
        else {
            return;
        };
        let mut settings = app.settings.borrow_mut();
        settings.auto_rotate_speed = v;
        dom::set_text(&app.document, "rotation-value", &settings.rotation_label());
        app.scene.borrow_mut().auto_rotate_speed = v;
    });

    for param in EffectParam::ALL {
        on(app, param.element_id(), "input", move |app| {
            let Some(v) = dom::input_value(&app.document, param.element_id())
                .and_then(|v| v.parse::<f32>().ok())
            else {
                return;
            };
            app.scene
                .borrow_mut()
                .post
                .set_param(param, param.from_slider(v));
        });
    }

    let systems = app.scene.borrow().particles.available_systems();
    for name in systems {
        let toggle_id = format!("system-{name}");
        let toggle_read = toggle_id.clone();
        on(app, &toggle_id, "change", move |app| {
            let Some(on) = checkbox_checked(&app.document, &toggle_read) else {
                return;
            };
            app.scene.borrow_mut().particles.toggle_system(name, on);
        });
        let slider_id = format!("system-{name}-intensity");
        let slider_read = slider_id.clone();
        on(app, &slider_id, "input", move |app| {
            let Some(v) = dom::input_value(&app.document, &slider_read)
                .and_then(|v| v.parse::<f32>().ok())
            else {
                return;
            };
            app.scene.borrow_mut().particles.set_intensity(name, v / 100.0);
            sync_system_controls(app);
        });
    }

    on(app, "post-processing", "change", |app| {
        let Some(on) = checkbox_checked(&app.document, "post-processing") else {
            return;
        };
        app.settings.borrow_mut().post_processing = on;
        app.scene.borrow_mut().post_enabled = on;
    });

    for effect in PostEffect::ALL {
        let id = format!("effect-{}", effect.name());
        let id_read = id.clone();
        on(app, &id, "change", move |app| {
            let Some(on) = checkbox_checked(&app.document, &id_read) else {
                return;
            };
            app.scene.borrow_mut().post.toggle_effect(effect.name(), on);
        });
    }

    on(app, "performance-stats", "change", |app| {
        let Some(on) = checkbox_checked(&app.document, "performance-stats") else {
            return;
        };
        if let Some(perf) = app.perf.borrow_mut().as_mut() {
            if on {
                perf.enable();
            } else {
                perf.disable();
            }
        }
    });

    on(app, "save-settings", "click", save);
    on(app, "reset-settings", "click", reset);
}

fn wire_minimap(app: &Rc<AppContext>) {
    for_each_element(&app.document, ".camera-preset", |el| {
        let Some(name) = el.get_attribute("data-preset") else {
            return;
        };
        let app = app.clone();
        dom::add_listener(&el, "click", move |_| {
            app.switch_view(&name);
            mark_active_preset(&app.document, &name);
        });
    });
}

fn mark_active_preset(document: &web::Document, name: &str) {
    for_each_element(document, ".camera-preset", |el| {
        let on = el.get_attribute("data-preset").as_deref() == Some(name);
        _ = el.class_list().toggle_with_force("active", on);
    });
}

fn wire_quick_actions(app: &Rc<AppContext>) {
    on(app, "settings-btn", "click", |app| {
        let open = app
            .document
            .get_element_by_id("settings-panel")
            .map_or(false, |p| p.class_list().contains("open"));
        set_panel_open(app, !open);
    });
    on(app, "screenshot-btn", "click", screenshot);
    on(app, "fullscreen-btn", "click", toggle_fullscreen);
    on(app, "help-btn", "click", |app| {
        notify(&app.document, SHORTCUT_HELP, NoticeKind::Info);
    });
}

fn set_panel_open(app: &AppContext, open: bool) {
    if let Some(panel) = app.document.get_element_by_id("settings-panel") {
        _ = panel.class_list().toggle_with_force("open", open);
    }
}

/// Apply a colour theme. Unknown names change nothing.
pub fn switch_theme(app: &AppContext, key: &str) -> bool {
    let Some(theme) = theme_by_key(key) else {
        log::warn!("[ui] unknown theme '{key}'");
        return false;
    };
    for_each_element(&app.document, ".theme-option", |el| {
        let on = el.get_attribute("data-theme").as_deref() == Some(key);
        _ = el.class_list().toggle_with_force("active", on);
    });
    if let Some(root) = app
        .document
        .document_element()
        .and_then(|e| e.dyn_into::<web::HtmlElement>().ok())
    {
        for (prop, value) in theme.css_properties() {
            _ = root.style().set_property(prop, value);
        }
    }
    app.theme.set(theme);
    app.scene.borrow_mut().background = theme.background_rgb();
    notify(
        &app.document,
        &format!("Switched to {} theme", theme.name),
        NoticeKind::Success,
    );
    true
}

/// Per-system checkboxes and sliders follow the particle state.
fn sync_system_controls(app: &AppContext) {
    let scene = app.scene.borrow();
    for s in &scene.particles.systems {
        let name = s.kind.name();
        let toggle = format!("system-{name}");
        if let Some(el) = dom::element_by_id::<web::HtmlInputElement>(&app.document, &toggle) {
            el.set_checked(s.visible);
        }
        let slider = format!("system-{name}-intensity");
        if let Some(el) = dom::element_by_id::<web::HtmlInputElement>(&app.document, &slider) {
            el.set_value(&((s.intensity * 100.0).round().max(0.0) as u32).to_string());
        }
    }
}

/// Mirror the shared settings into every control.
pub fn update_ui_from_settings(app: &AppContext) {
    let settings = app.settings.borrow();
    let document = &app.document;
    if let Some(el) = dom::element_by_id::<web::HtmlInputElement>(document, "particle-intensity") {
        el.set_value(&settings.particle_slider_value().to_string());
    }
    dom::set_text(document, "particle-value", &settings.particle_label());
    if let Some(el) = dom::element_by_id::<web::HtmlInputElement>(document, "rotation-speed") {
        el.set_value(&settings.auto_rotate_speed.to_string());
    }
    dom::set_text(document, "rotation-value", &settings.rotation_label());
    if let Some(el) = dom::element_by_id::<web::HtmlSelectElement>(document, "environment-select") {
        el.set_value(&settings.environment_lighting);
    }
    if let Some(el) = dom::element_by_id::<web::HtmlSelectElement>(document, "weather-select") {
        el.set_value(&settings.weather);
    }
    if let Some(el) = dom::element_by_id::<web::HtmlSelectElement>(document, "render-quality") {
        el.set_value(settings.render_quality.name());
    }
    if let Some(el) = dom::element_by_id::<web::HtmlInputElement>(document, "post-processing") {
        el.set_checked(settings.post_processing);
    }
}

pub fn save(app: &AppContext) {
    let result = save_settings(
        app.store.borrow_mut().as_mut(),
        &app.settings.borrow(),
        app.theme.get().key,
    );
    match result {
        Ok(()) => notify(&app.document, "Settings saved!", NoticeKind::Success),
        Err(e) => {
            log::error!("[settings] save failed: {e}");
            notify(&app.document, "Could not save settings", NoticeKind::Error);
        }
    }
}

pub fn load(app: &AppContext) {
    let loaded = load_settings(app.store.borrow().as_ref());
    *app.settings.borrow_mut() = loaded.settings;
    update_ui_from_settings(app);
    app.apply_settings();
    sync_system_controls(app);
    // the theme recolours the background after the environment has set it
    if let Some(theme) = loaded.theme {
        switch_theme(app, &theme);
    }
    log::info!("[settings] loaded");
}

pub fn reset(app: &AppContext) {
    *app.settings.borrow_mut() = Settings::default();
    update_ui_from_settings(app);
    app.apply_settings();
    sync_system_controls(app);
    notify(&app.document, "Settings reset to defaults", NoticeKind::Success);
}

fn screenshot(app: &AppContext) {
    app.render_now();
    let Ok(url) = app.canvas.to_data_url() else {
        notify(&app.document, "Screenshot failed", NoticeKind::Error);
        return;
    };
    let Some(link) = app
        .document
        .create_element("a")
        .ok()
        .and_then(|e| e.dyn_into::<web::HtmlAnchorElement>().ok())
    else {
        return;
    };
    link.set_download(&format!("contemplative-head-{}.png", js_sys::Date::now() as u64));
    link.set_href(&url);
    link.click();
    notify(&app.document, "Screenshot saved!", NoticeKind::Success);
}

fn toggle_fullscreen(app: &AppContext) {
    let document = &app.document;
    if document.fullscreen_element().is_none() {
        if let Some(root) = document.document_element() {
            _ = root.request_fullscreen();
        }
        notify(document, "Entered fullscreen mode", NoticeKind::Success);
    } else {
        document.exit_fullscreen();
        notify(document, "Exited fullscreen mode", NoticeKind::Success);
    }
}
