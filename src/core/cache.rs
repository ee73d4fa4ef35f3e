//! Offline caching policy for the service worker.
//!
//! [`CacheRouter`] decides, per request, which cache to consult and when to
//! go to the network. Everything that touches browser APIs sits behind
//! [`WorkerHost`], so the routing rules run unchanged against an in-memory
//! host in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ASSET_CACHE: &str = "contemplative-head-v1.2.0";
pub const STATIC_CACHE: &str = "contemplative-head-static-v1.2.0";

pub const STATIC_RESOURCES: [&str; 8] = [
    "/",
    "/index.html",
    "/css/styles.css",
    "/pkg/head_web.js",
    "/pkg/head_web_bg.wasm",
    "/sw.js",
    "/favicon.ico",
    "/manifest.json",
];
pub const LARGE_RESOURCES: [&str; 1] = ["/faceSculpting.glb"];

pub const APP_SHELL: &str = "/index.html";
pub const OFFLINE_FALLBACK: &str = "/offline-fallback.html";
pub const SYNC_TAG: &str = "background-sync";
pub const SLOW_REQUEST_MS: f64 = 1000.0;

const LARGE_ASSET_EXTENSIONS: [&str; 4] = [".glb", ".gltf", ".jpg", ".png"];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CacheError {
    #[error("network request for {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("cache storage error: {0}")]
    Storage(String),
}

/// The parts of a request the router looks at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestInfo {
    pub url: String,
    pub path: String,
    pub origin: String,
    pub method: String,
    pub navigate: bool,
}

impl RequestInfo {
    /// A same-page GET for `path` under `origin`.
    pub fn get(origin: &str, path: &str) -> Self {
        Self {
            url: format!("{origin}{path}"),
            path: path.to_string(),
            origin: origin.to_string(),
            method: "GET".to_string(),
            navigate: false,
        }
    }

    pub fn navigation(origin: &str, path: &str) -> Self {
        Self {
            navigate: true,
            ..Self::get(origin, path)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Navigation,
    Static,
    LargeAsset,
    CrossOrigin,
    Default,
}

/// True when `path` names one of the app-shell files. The bare `/` entry
/// only matches the root itself.
pub fn is_static_path(path: &str) -> bool {
    STATIC_RESOURCES.iter().any(|resource| {
        let file = resource.rsplit('/').next().unwrap_or_default();
        if file.is_empty() {
            path == "/"
        } else {
            path.ends_with(file)
        }
    })
}

pub fn is_large_asset(path: &str) -> bool {
    LARGE_ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// First matching rule wins. Non-GET requests are not intercepted.
pub fn classify(request: &RequestInfo, worker_origin: &str) -> Option<Route> {
    if request.method != "GET" {
        return None;
    }
    let route = if request.navigate {
        Route::Navigation
    } else if is_static_path(&request.path) {
        Route::Static
    } else if is_large_asset(&request.path) {
        Route::LargeAsset
    } else if request.origin != worker_origin {
        Route::CrossOrigin
    } else {
        Route::Default
    };
    Some(route)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMode {
    SameOrigin,
    /// `mode: cors`, credentials omitted.
    Cors,
}

pub trait CachedResponse {
    fn status(&self) -> u16;
    fn content_length(&self) -> Option<u64>;

    fn ok(&self) -> bool {
        (200..300).contains(&self.status())
    }
}

/// Browser capabilities the router needs. Implemented over `web-sys` in the
/// worker and by an in-memory host in tests.
#[allow(async_fn_in_trait)]
pub trait WorkerHost {
    type Response: CachedResponse;

    async fn cache_match(&self, cache: &str, url: &str)
        -> Result<Option<Self::Response>, CacheError>;
    /// Store a copy of `response`; the caller keeps the original.
    async fn cache_put(&self, cache: &str, url: &str, response: &Self::Response)
        -> Result<(), CacheError>;
    async fn cache_add_all(&self, cache: &str, urls: &[String]) -> Result<(), CacheError>;
    async fn cache_names(&self) -> Result<Vec<String>, CacheError>;
    async fn cache_delete(&self, cache: &str) -> Result<bool, CacheError>;
    /// Sum of body sizes of every entry in `cache`.
    async fn cache_size(&self, cache: &str) -> Result<u64, CacheError>;
    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<Self::Response, CacheError>;
    /// Fetch every URL concurrently and report each result in order.
    async fn fetch_all(&self, urls: &[String]) -> Vec<Result<Self::Response, CacheError>>;
    async fn notify_clients(&self, message: &ClientMessage);
    async fn skip_waiting(&self) -> Result<(), CacheError>;
    async fn claim_clients(&self) -> Result<(), CacheError>;
    fn text_response(&self, status: u16, body: &str) -> Self::Response;
}

/// Messages the page sends to the worker.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerCommand {
    SkipWaiting,
    CacheUrls {
        urls: Vec<String>,
    },
    ClearCache {
        #[serde(rename = "cacheName", default)]
        cache_name: Option<String>,
    },
    GetCacheSize,
    #[serde(other)]
    Unknown,
}

impl WorkerCommand {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Notifications the worker posts to every client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    AssetCached {
        url: String,
        size: Option<u64>,
    },
    UrlsCached {
        urls: Vec<String>,
    },
    CacheCleared {
        #[serde(rename = "cacheName")]
        cache_name: Option<String>,
        success: bool,
    },
    ResourcesUpdated,
}

/// Reply posted on the message port for `GET_CACHE_SIZE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSizeReply {
    pub size: u64,
}

/// A routed response plus any refresh the caller should run in the
/// background (stale-while-revalidate for navigations).
pub struct Outcome<R> {
    pub response: R,
    pub background_refresh: Option<String>,
}

impl<R> Outcome<R> {
    fn now(response: R) -> Self {
        Self {
            response,
            background_refresh: None,
        }
    }
}

pub struct CacheRouter<H: WorkerHost> {
    host: H,
    origin: String,
}

impl<H: WorkerHost> CacheRouter<H> {
    pub fn new(host: H, origin: impl Into<String>) -> Self {
        Self {
            host,
            origin: origin.into(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Pre-cache the app shell and the large assets, then skip waiting.
    pub async fn install(&self) -> Result<(), CacheError> {
        log::info!("[sw] installing");
        let shell: Vec<String> = STATIC_RESOURCES.iter().map(|s| s.to_string()).collect();
        let large: Vec<String> = LARGE_RESOURCES.iter().map(|s| s.to_string()).collect();
        self.host.cache_add_all(STATIC_CACHE, &shell).await?;
        self.host.cache_add_all(ASSET_CACHE, &large).await?;
        self.host.skip_waiting().await?;
        log::info!("[sw] installation complete");
        Ok(())
    }

    /// Delete caches from older versions and take control of open pages.
    /// Returns the names that were deleted.
    pub async fn activate(&self) -> Result<Vec<String>, CacheError> {
        let mut deleted = Vec::new();
        for name in self.host.cache_names().await? {
            if name != ASSET_CACHE && name != STATIC_CACHE {
                log::info!("[sw] deleting old cache {name}");
                if self.host.cache_delete(&name).await? {
                    deleted.push(name);
                }
            }
        }
        self.host.claim_clients().await?;
        log::info!("[sw] activation complete");
        Ok(deleted)
    }

    /// Route a request. `None` means the request is not intercepted.
    /// Never fails: routes without a fallback answer with a 504.
    pub async fn respond(&self, request: &RequestInfo) -> Option<Outcome<H::Response>> {
        let route = classify(request, &self.origin)?;
        let outcome = match self.handle(route, request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("[sw] {:?} request failed: {e}", route);
                Outcome::now(self.host.text_response(504, "Network error"))
            }
        };
        Some(outcome)
    }

    pub async fn handle(
        &self,
        route: Route,
        request: &RequestInfo,
    ) -> Result<Outcome<H::Response>, CacheError> {
        match route {
            Route::Navigation => Ok(self.navigation(request).await),
            Route::Static => self
                .cache_first(STATIC_CACHE, &request.url)
                .await
                .map(Outcome::now),
            Route::LargeAsset => Ok(Outcome::now(self.large_asset(request).await)),
            Route::CrossOrigin => self.cross_origin(request).await.map(Outcome::now),
            Route::Default => self
                .cache_first(ASSET_CACHE, &request.url)
                .await
                .map(Outcome::now),
        }
    }

    async fn lookup(&self, cache: &str, url: &str) -> Option<H::Response> {
        match self.host.cache_match(cache, url).await {
            Ok(hit) => hit,
            Err(e) => {
                log::warn!("[sw] cache lookup for {url} failed: {e}");
                None
            }
        }
    }

    async fn store(&self, cache: &str, url: &str, response: &H::Response) {
        if let Err(e) = self.host.cache_put(cache, url, response).await {
            log::warn!("[sw] could not cache {url}: {e}");
        }
    }

    async fn navigation(&self, request: &RequestInfo) -> Outcome<H::Response> {
        if let Some(shell) = self.lookup(STATIC_CACHE, APP_SHELL).await {
            return Outcome {
                response: shell,
                background_refresh: Some(request.url.clone()),
            };
        }
        match self.host.fetch(&request.url, FetchMode::SameOrigin).await {
            Ok(response) => Outcome::now(response),
            Err(e) => {
                log::error!("[sw] navigation failed: {e}");
                Outcome::now(self.host.text_response(503, "Application offline"))
            }
        }
    }

    async fn cache_first(&self, cache: &str, url: &str) -> Result<H::Response, CacheError> {
        if let Some(hit) = self.lookup(cache, url).await {
            return Ok(hit);
        }
        let response = self.host.fetch(url, FetchMode::SameOrigin).await?;
        if response.ok() {
            self.store(cache, url, &response).await;
        }
        Ok(response)
    }

    async fn large_asset(&self, request: &RequestInfo) -> H::Response {
        if let Some(hit) = self.lookup(ASSET_CACHE, &request.url).await {
            log::info!("[sw] serving cached asset {}", request.url);
            return hit;
        }
        log::info!("[sw] fetching asset {}", request.url);
        match self.host.fetch(&request.url, FetchMode::SameOrigin).await {
            Ok(response) => {
                if response.ok() {
                    self.store(ASSET_CACHE, &request.url, &response).await;
                    self.host
                        .notify_clients(&ClientMessage::AssetCached {
                            url: request.url.clone(),
                            size: response.content_length(),
                        })
                        .await;
                }
                response
            }
            Err(e) => {
                log::error!("[sw] asset request failed: {e}");
                match self.lookup(ASSET_CACHE, OFFLINE_FALLBACK).await {
                    Some(fallback) => fallback,
                    None => self.host.text_response(503, "Asset unavailable offline"),
                }
            }
        }
    }

    async fn cross_origin(&self, request: &RequestInfo) -> Result<H::Response, CacheError> {
        match self.host.fetch(&request.url, FetchMode::Cors).await {
            Ok(response) => {
                if response.ok() {
                    self.store(ASSET_CACHE, &request.url, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                log::info!("[sw] external resource failed, trying cache: {}", request.url);
                if let Some(hit) = self.lookup(ASSET_CACHE, &request.url).await {
                    return Ok(hit);
                }
                if request.url.contains("font") {
                    return Ok(self.host.text_response(204, ""));
                }
                Err(e)
            }
        }
    }

    /// Re-fetch `url` and store it in the shell cache if the fetch succeeds.
    pub async fn refresh_resource(&self, url: &str) {
        match self.host.fetch(url, FetchMode::SameOrigin).await {
            Ok(response) if response.ok() => self.store(STATIC_CACHE, url, &response).await,
            Ok(response) => log::info!("[sw] refresh of {url} returned {}", response.status()),
            Err(e) => log::info!("[sw] refresh of {url} failed: {e}"),
        }
    }

    /// Handle a page message. Returns the size reply for `GET_CACHE_SIZE`.
    pub async fn handle_message(&self, command: WorkerCommand) -> Option<CacheSizeReply> {
        match command {
            WorkerCommand::SkipWaiting => {
                if let Err(e) = self.host.skip_waiting().await {
                    log::error!("[sw] skip waiting failed: {e}");
                }
                None
            }
            WorkerCommand::CacheUrls { urls } => {
                self.cache_urls(urls).await;
                None
            }
            WorkerCommand::ClearCache { cache_name } => {
                self.clear_cache(cache_name).await;
                None
            }
            WorkerCommand::GetCacheSize => Some(CacheSizeReply {
                size: self.cache_size().await,
            }),
            WorkerCommand::Unknown => {
                log::info!("[sw] unknown message type");
                None
            }
        }
    }

    pub async fn cache_urls(&self, urls: Vec<String>) {
        match self.host.cache_add_all(ASSET_CACHE, &urls).await {
            Ok(()) => {
                self.host
                    .notify_clients(&ClientMessage::UrlsCached { urls })
                    .await
            }
            Err(e) => log::error!("[sw] failed to cache urls: {e}"),
        }
    }

    /// Delete `cache_name`, or the asset cache when none is given.
    pub async fn clear_cache(&self, cache_name: Option<String>) {
        let target = cache_name.as_deref().unwrap_or(ASSET_CACHE);
        match self.host.cache_delete(target).await {
            Ok(success) => {
                self.host
                    .notify_clients(&ClientMessage::CacheCleared {
                        cache_name,
                        success,
                    })
                    .await
            }
            Err(e) => log::error!("[sw] failed to clear cache {target}: {e}"),
        }
    }

    /// Total bytes across every cache; 0 if storage cannot be read.
    pub async fn cache_size(&self) -> u64 {
        let names = match self.host.cache_names().await {
            Ok(names) => names,
            Err(e) => {
                log::error!("[sw] failed to list caches: {e}");
                return 0;
            }
        };
        let mut total = 0;
        for name in names {
            match self.host.cache_size(&name).await {
                Ok(size) => total += size,
                Err(e) => {
                    log::error!("[sw] failed to size cache {name}: {e}");
                    return 0;
                }
            }
        }
        total
    }

    /// Refresh every shell resource concurrently; failures are logged and
    /// skipped. Clients are told once all fetches have settled.
    pub async fn background_sync(&self) {
        let urls: Vec<String> = STATIC_RESOURCES.iter().map(|s| s.to_string()).collect();
        let results = self.host.fetch_all(&urls).await;
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(response) if response.ok() => self.store(STATIC_CACHE, url, &response).await,
                Ok(_) => {}
                Err(_) => log::info!("[sw] failed to update {url}"),
            }
        }
        self.host
            .notify_clients(&ClientMessage::ResourcesUpdated)
            .await;
    }
}

#[inline]
pub fn is_slow_request(duration_ms: f64) -> bool {
    duration_ms > SLOW_REQUEST_MS
}

/// Outcome handed back to `waitUntil`. A failed lifecycle step must reject,
/// otherwise the browser keeps a worker whose caches are incomplete.
pub fn lifecycle_outcome<T>(step: &str, result: Result<T, CacheError>) -> Result<(), String> {
    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("[sw] {step} failed: {e}");
            Err(format!("{step} failed: {e}"))
        }
    }
}
