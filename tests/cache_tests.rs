// Host-side tests for the service-worker caching policy, run against an
// in-memory host. The main crate is wasm-only, so we include the pure-Rust
// cache module directly.

#![allow(dead_code)]
#[path = "../src/core/cache.rs"]
mod cache;

use cache::*;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

const ORIGIN: &str = "https://head.test";

#[derive(Clone, Debug, PartialEq)]
struct FakeResponse {
    status: u16,
    body: String,
}

impl FakeResponse {
    fn text(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }
}

impl CachedResponse for FakeResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.body.len() as u64)
    }
}

/// Caches and network keyed by absolute URL, like the browser normalises them.
#[derive(Default)]
struct FakeHost {
    caches: RefCell<BTreeMap<String, BTreeMap<String, FakeResponse>>>,
    network: RefCell<BTreeMap<String, FakeResponse>>,
    offline: Cell<bool>,
    fetched: RefCell<Vec<(String, FetchMode)>>,
    notices: RefCell<Vec<ClientMessage>>,
    skipped_waiting: Cell<bool>,
    claimed: Cell<bool>,
}

fn absolute(url: &str) -> String {
    if url.starts_with('/') {
        format!("{ORIGIN}{url}")
    } else {
        url.to_string()
    }
}

impl FakeHost {
    fn serve(&self, path: &str, body: &str) {
        self.network
            .borrow_mut()
            .insert(absolute(path), FakeResponse::text(body));
    }

    fn serve_status(&self, path: &str, status: u16) {
        self.network.borrow_mut().insert(
            absolute(path),
            FakeResponse {
                status,
                body: String::new(),
            },
        );
    }

    fn cached(&self, cache: &str, url: &str) -> Option<FakeResponse> {
        self.caches
            .borrow()
            .get(cache)
            .and_then(|c| c.get(&absolute(url)).cloned())
    }

    fn seed(&self, cache: &str, url: &str, body: &str) {
        self.caches
            .borrow_mut()
            .entry(cache.to_string())
            .or_default()
            .insert(absolute(url), FakeResponse::text(body));
    }

    fn network_get(&self, url: &str) -> Result<FakeResponse, CacheError> {
        let url = absolute(url);
        if self.offline.get() {
            return Err(CacheError::Network {
                url,
                reason: "offline".into(),
            });
        }
        Ok(self
            .network
            .borrow()
            .get(&url)
            .cloned()
            .unwrap_or(FakeResponse {
                status: 404,
                body: String::new(),
            }))
    }
}

impl WorkerHost for FakeHost {
    type Response = FakeResponse;

    async fn cache_match(&self, cache: &str, url: &str) -> Result<Option<FakeResponse>, CacheError> {
        Ok(self.cached(cache, url))
    }

    async fn cache_put(&self, cache: &str, url: &str, response: &FakeResponse) -> Result<(), CacheError> {
        self.caches
            .borrow_mut()
            .entry(cache.to_string())
            .or_default()
            .insert(absolute(url), response.clone());
        Ok(())
    }

    async fn cache_add_all(&self, cache: &str, urls: &[String]) -> Result<(), CacheError> {
        let mut fetched = Vec::new();
        for url in urls {
            let response = self.network_get(url)?;
            if !response.ok() {
                return Err(CacheError::Network {
                    url: url.clone(),
                    reason: format!("status {}", response.status),
                });
            }
            fetched.push((absolute(url), response));
        }
        self.caches
            .borrow_mut()
            .entry(cache.to_string())
            .or_default()
            .extend(fetched);
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.caches.borrow().keys().cloned().collect())
    }

    async fn cache_delete(&self, cache: &str) -> Result<bool, CacheError> {
        Ok(self.caches.borrow_mut().remove(cache).is_some())
    }

    async fn cache_size(&self, cache: &str) -> Result<u64, CacheError> {
        Ok(self
            .caches
            .borrow()
            .get(cache)
            .map_or(0, |c| c.values().map(|r| r.body.len() as u64).sum()))
    }

    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<FakeResponse, CacheError> {
        self.fetched.borrow_mut().push((absolute(url), mode));
        self.network_get(url)
    }

    async fn fetch_all(&self, urls: &[String]) -> Vec<Result<FakeResponse, CacheError>> {
        urls.iter().map(|u| self.network_get(u)).collect()
    }

    async fn notify_clients(&self, message: &ClientMessage) {
        self.notices.borrow_mut().push(message.clone());
    }

    async fn skip_waiting(&self) -> Result<(), CacheError> {
        self.skipped_waiting.set(true);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), CacheError> {
        self.claimed.set(true);
        Ok(())
    }

    fn text_response(&self, status: u16, body: &str) -> FakeResponse {
        FakeResponse {
            status,
            body: body.to_string(),
        }
    }
}

fn online_host() -> FakeHost {
    let host = FakeHost::default();
    for path in STATIC_RESOURCES {
        host.serve(path, &format!("shell {path}"));
    }
    for path in LARGE_RESOURCES {
        host.serve(path, "glb bytes");
    }
    host
}

fn router(host: FakeHost) -> CacheRouter<FakeHost> {
    CacheRouter::new(host, ORIGIN)
}

fn respond(router: &CacheRouter<FakeHost>, request: &RequestInfo) -> Outcome<FakeResponse> {
    pollster::block_on(router.respond(request)).expect("request should be routed")
}

#[test]
fn classification_follows_rule_order() {
    let get = |path: &str| RequestInfo::get(ORIGIN, path);
    assert_eq!(
        classify(&RequestInfo::navigation(ORIGIN, "/css/styles.css"), ORIGIN),
        Some(Route::Navigation)
    );
    assert_eq!(classify(&get("/css/styles.css"), ORIGIN), Some(Route::Static));
    assert_eq!(classify(&get("/"), ORIGIN), Some(Route::Static));
    assert_eq!(classify(&get("/models/head.glb"), ORIGIN), Some(Route::LargeAsset));
    assert_eq!(classify(&get("/data/config.json"), ORIGIN), Some(Route::Default));
    let external = RequestInfo::get("https://fonts.example", "/inter.woff2");
    assert_eq!(classify(&external, ORIGIN), Some(Route::CrossOrigin));

    let mut post = get("/index.html");
    post.method = "POST".into();
    assert_eq!(classify(&post, ORIGIN), None);
}

#[test]
fn root_entry_only_matches_root() {
    assert!(is_static_path("/"));
    assert!(is_static_path("/index.html"));
    assert!(!is_static_path("/gallery/"));
    assert!(!is_static_path("/api/items"));
    assert!(is_large_asset("/textures/skin.jpg"));
    assert!(!is_large_asset("/textures/skin.webp"));
}

#[test]
fn install_precaches_and_skips_waiting() {
    let router = router(online_host());
    pollster::block_on(router.install()).unwrap();
    let host = router.host();
    assert!(host.skipped_waiting.get());
    for path in STATIC_RESOURCES {
        assert!(host.cached(STATIC_CACHE, path).is_some(), "{path} not cached");
    }
    assert!(host.cached(ASSET_CACHE, LARGE_RESOURCES[0]).is_some());
}

#[test]
fn install_fails_when_a_resource_is_missing() {
    let host = online_host();
    host.serve_status("/manifest.json", 404);
    let router = router(host);
    assert!(pollster::block_on(router.install()).is_err());
    assert!(!router.host().skipped_waiting.get());
}

#[test]
fn failed_lifecycle_steps_reject() {
    let host = online_host();
    host.serve_status("/manifest.json", 404);
    let failing = router(host);
    let outcome = lifecycle_outcome("installation", pollster::block_on(failing.install()));
    let message = outcome.unwrap_err();
    assert!(message.starts_with("installation failed"), "{message}");
    assert!(message.contains("manifest.json"), "{message}");

    let healthy = router(online_host());
    assert_eq!(
        lifecycle_outcome("installation", pollster::block_on(healthy.install())),
        Ok(())
    );
    assert_eq!(
        lifecycle_outcome("activation", pollster::block_on(healthy.activate())),
        Ok(())
    );
}

#[test]
fn precached_site_files_ship_with_the_page() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    for path in STATIC_RESOURCES {
        // wasm-pack writes pkg/ at build time
        if path.starts_with("/pkg/") {
            continue;
        }
        let file = if path == "/" { "index.html" } else { &path[1..] };
        assert!(root.join(file).is_file(), "{path} is precached but missing");
    }
}

#[test]
fn worker_script_waits_for_the_module_before_routing() {
    let script = include_str!("../sw.js");
    let routed = script
        .find("wasm_bindgen.sw_fetch(event.request) ?? fetch(event.request)")
        .expect("fetch handler routes through the module");
    let waits = script.find("event.respondWith(").expect("fetch handler responds");
    assert!(waits < routed);
    assert!(script[waits..routed].contains("ready.then("));
    assert!(!script.contains("if (!wasm_bindgen.sw_fetch)"));
}

#[test]
fn cached_static_resource_is_served_offline() {
    let router = router(online_host());
    pollster::block_on(router.install()).unwrap();
    router.host().offline.set(true);
    router.host().fetched.borrow_mut().clear();

    let outcome = respond(&router, &RequestInfo::get(ORIGIN, "/css/styles.css"));
    assert_eq!(outcome.response.status, 200);
    assert_eq!(outcome.response.body, "shell /css/styles.css");
    assert!(outcome.background_refresh.is_none());
    assert!(router.host().fetched.borrow().is_empty());
}

#[test]
fn uncached_large_asset_offline_is_503() {
    let host = FakeHost::default();
    host.offline.set(true);
    let router = router(host);
    let outcome = respond(&router, &RequestInfo::get(ORIGIN, "/faceSculpting.glb"));
    assert_eq!(outcome.response.status, 503);
    assert_eq!(outcome.response.body, "Asset unavailable offline");
}

#[test]
fn large_asset_offline_uses_fallback_when_cached() {
    let host = FakeHost::default();
    host.offline.set(true);
    host.seed(ASSET_CACHE, OFFLINE_FALLBACK, "offline page");
    let router = router(host);
    let outcome = respond(&router, &RequestInfo::get(ORIGIN, "/faceSculpting.glb"));
    assert_eq!(outcome.response.body, "offline page");
}

#[test]
fn fetched_large_asset_is_cached_and_announced() {
    let router = router(online_host());
    let request = RequestInfo::get(ORIGIN, "/faceSculpting.glb");
    let outcome = respond(&router, &request);
    assert_eq!(outcome.response.status, 200);
    let host = router.host();
    assert!(host.cached(ASSET_CACHE, &request.url).is_some());
    assert_eq!(
        host.notices.borrow().as_slice(),
        &[ClientMessage::AssetCached {
            url: request.url.clone(),
            size: Some("glb bytes".len() as u64),
        }]
    );

    // second request is a cache hit
    host.fetched.borrow_mut().clear();
    respond(&router, &request);
    assert!(host.fetched.borrow().is_empty());
}

#[test]
fn navigation_serves_shell_and_refreshes_in_background() {
    let host = online_host();
    host.seed(STATIC_CACHE, APP_SHELL, "old shell");
    let router = router(host);
    let request = RequestInfo::navigation(ORIGIN, "/");
    let outcome = respond(&router, &request);
    assert_eq!(outcome.response.body, "old shell");
    assert_eq!(outcome.background_refresh.as_deref(), Some(request.url.as_str()));

    pollster::block_on(router.refresh_resource(&request.url));
    let refreshed = router.host().cached(STATIC_CACHE, &request.url).unwrap();
    assert_eq!(refreshed.body, "shell /");
}

#[test]
fn navigation_without_shell_goes_to_network_or_503() {
    let router = router(online_host());
    let outcome = respond(&router, &RequestInfo::navigation(ORIGIN, "/index.html"));
    assert_eq!(outcome.response.body, "shell /index.html");
    assert!(outcome.background_refresh.is_none());

    router.host().offline.set(true);
    let outcome = respond(&router, &RequestInfo::navigation(ORIGIN, "/index.html"));
    assert_eq!(outcome.response.status, 503);
    assert_eq!(outcome.response.body, "Application offline");
}

#[test]
fn cross_origin_uses_cors_and_falls_back() {
    let host = FakeHost::default();
    let font = "https://fonts.example/inter-font.woff2";
    let script = "https://cdn.example/lib.js";
    host.network
        .borrow_mut()
        .insert(font.to_string(), FakeResponse::text("font"));
    let router = router(host);

    let font_req = RequestInfo::get("https://fonts.example", "/inter-font.woff2");
    let outcome = respond(&router, &font_req);
    assert_eq!(outcome.response.body, "font");
    assert_eq!(
        router.host().fetched.borrow().last(),
        Some(&(font.to_string(), FetchMode::Cors))
    );
    assert!(router.host().cached(ASSET_CACHE, font).is_some());

    router.host().offline.set(true);
    assert_eq!(respond(&router, &font_req).response.body, "font");

    router.host().caches.borrow_mut().clear();
    assert_eq!(respond(&router, &font_req).response.status, 204);

    let script_req = RequestInfo::get("https://cdn.example", "/lib.js");
    assert_eq!(script_req.url, script);
    let outcome = respond(&router, &script_req);
    assert_eq!(outcome.response.status, 504);
    assert_eq!(outcome.response.body, "Network error");
}

#[test]
fn default_route_caches_only_successes() {
    let host = FakeHost::default();
    host.serve("/data/good.json", "{}");
    host.serve_status("/data/bad.json", 500);
    let router = router(host);
    respond(&router, &RequestInfo::get(ORIGIN, "/data/good.json"));
    respond(&router, &RequestInfo::get(ORIGIN, "/data/bad.json"));
    assert!(router.host().cached(ASSET_CACHE, "/data/good.json").is_some());
    assert!(router.host().cached(ASSET_CACHE, "/data/bad.json").is_none());
}

#[test]
fn activate_removes_stale_caches() {
    let host = FakeHost::default();
    host.seed(STATIC_CACHE, "/", "a");
    host.seed(ASSET_CACHE, "/x.glb", "b");
    host.seed("contemplative-head-v1.1.0", "/", "old");
    let router = router(host);
    let deleted = pollster::block_on(router.activate()).unwrap();
    assert_eq!(deleted, vec!["contemplative-head-v1.1.0".to_string()]);
    assert!(router.host().claimed.get());
    assert_eq!(
        pollster::block_on(router.host().cache_names()).unwrap().len(),
        2
    );
}

#[test]
fn page_commands_parse() {
    assert_eq!(
        WorkerCommand::parse(r#"{"type":"SKIP_WAITING"}"#).unwrap(),
        WorkerCommand::SkipWaiting
    );
    assert_eq!(
        WorkerCommand::parse(r#"{"type":"GET_CACHE_SIZE"}"#).unwrap(),
        WorkerCommand::GetCacheSize
    );
    assert_eq!(
        WorkerCommand::parse(r#"{"type":"CACHE_URLS","data":{"urls":["/a.png"]}}"#).unwrap(),
        WorkerCommand::CacheUrls {
            urls: vec!["/a.png".into()]
        }
    );
    assert_eq!(
        WorkerCommand::parse(r#"{"type":"CLEAR_CACHE","data":{"cacheName":"x"}}"#).unwrap(),
        WorkerCommand::ClearCache {
            cache_name: Some("x".into())
        }
    );
    assert_eq!(
        WorkerCommand::parse(r#"{"type":"CLEAR_CACHE","data":{}}"#).unwrap(),
        WorkerCommand::ClearCache { cache_name: None }
    );
    assert_eq!(
        WorkerCommand::parse(r#"{"type":"PING"}"#).unwrap(),
        WorkerCommand::Unknown
    );
    assert!(WorkerCommand::parse("nope").is_err());
}

#[test]
fn client_messages_are_flat_json() {
    let json = serde_json::to_value(ClientMessage::AssetCached {
        url: "u".into(),
        size: Some(3),
    })
    .unwrap();
    assert_eq!(json, serde_json::json!({"type": "ASSET_CACHED", "url": "u", "size": 3}));
    let json = serde_json::to_value(ClientMessage::ResourcesUpdated).unwrap();
    assert_eq!(json, serde_json::json!({"type": "RESOURCES_UPDATED"}));
}

#[test]
fn cache_commands_reach_the_host() {
    let router = router(online_host());
    pollster::block_on(router.install()).unwrap();

    let reply = pollster::block_on(router.handle_message(WorkerCommand::GetCacheSize)).unwrap();
    let expected: u64 = STATIC_RESOURCES
        .iter()
        .map(|p| format!("shell {p}").len() as u64)
        .sum::<u64>()
        + "glb bytes".len() as u64;
    assert_eq!(reply.size, expected);

    let urls = vec!["/manifest.json".to_string()];
    pollster::block_on(router.handle_message(WorkerCommand::CacheUrls { urls: urls.clone() }));
    assert!(router.host().cached(ASSET_CACHE, "/manifest.json").is_some());

    pollster::block_on(router.handle_message(WorkerCommand::ClearCache { cache_name: None }));
    assert!(router.host().cached(ASSET_CACHE, "/manifest.json").is_none());
    assert_eq!(
        router.host().notices.borrow().as_slice(),
        &[
            ClientMessage::UrlsCached { urls },
            ClientMessage::CacheCleared {
                cache_name: None,
                success: true
            },
        ]
    );
}

#[test]
fn background_sync_keeps_going_past_failures() {
    let host = online_host();
    host.network.borrow_mut().remove(&absolute("/favicon.ico"));
    host.serve("/index.html", "new shell");
    let router = router(host);
    pollster::block_on(router.background_sync());
    let host = router.host();
    assert_eq!(host.cached(STATIC_CACHE, "/index.html").unwrap().body, "new shell");
    assert!(host.cached(STATIC_CACHE, "/favicon.ico").is_none());
    assert_eq!(
        host.notices.borrow().last(),
        Some(&ClientMessage::ResourcesUpdated)
    );
}

#[test]
fn slow_request_threshold() {
    assert!(!is_slow_request(SLOW_REQUEST_MS));
    assert!(is_slow_request(SLOW_REQUEST_MS + 1.0));
}
