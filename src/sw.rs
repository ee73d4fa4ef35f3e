//! Service-worker glue: a [`WorkerHost`] over CacheStorage / fetch / Clients,
//! and the entry points `sw.js` forwards its events to.

use crate::core::cache::{
    classify, is_slow_request, lifecycle_outcome, CacheError, CacheRouter, CachedResponse,
    ClientMessage, FetchMode, RequestInfo, WorkerCommand, WorkerHost, SYNC_TAG,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local, JsFuture};
use web_sys as web;

fn js_err(e: JsValue) -> CacheError {
    CacheError::Storage(format!("{:?}", e))
}

fn to_js<T: Serialize>(value: &T) -> Option<JsValue> {
    let json = serde_json::to_string(value).ok()?;
    js_sys::JSON::parse(&json).ok()
}

pub struct WebResponse(web::Response);

impl CachedResponse for WebResponse {
    fn status(&self) -> u16 {
        self.0.status()
    }

    fn content_length(&self) -> Option<u64> {
        self.0
            .headers()
            .get("content-length")
            .ok()
            .flatten()
            .and_then(|v| v.parse().ok())
    }
}

pub struct WebHost {
    scope: web::ServiceWorkerGlobalScope,
}

impl WebHost {
    fn current() -> Self {
        Self {
            scope: js_sys::global().unchecked_into(),
        }
    }

    async fn open(&self, name: &str) -> Result<web::Cache, CacheError> {
        let caches = self.scope.caches().map_err(js_err)?;
        JsFuture::from(caches.open(name))
            .await
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)
    }

    fn fetch_promise(&self, url: &str, mode: FetchMode) -> js_sys::Promise {
        match mode {
            FetchMode::SameOrigin => self.scope.fetch_with_str(url),
            FetchMode::Cors => {
                let init = web::RequestInit::new();
                init.set_mode(web::RequestMode::Cors);
                init.set_credentials(web::RequestCredentials::Omit);
                self.scope.fetch_with_str_and_init(url, &init)
            }
        }
    }
}

impl WorkerHost for WebHost {
    type Response = WebResponse;

    async fn cache_match(&self, cache: &str, url: &str) -> Result<Option<WebResponse>, CacheError> {
        let cache = self.open(cache).await?;
        let hit = JsFuture::from(cache.match_with_str(url))
            .await
            .map_err(js_err)?;
        if hit.is_undefined() || hit.is_null() {
            return Ok(None);
        }
        Ok(Some(WebResponse(hit.dyn_into().map_err(js_err)?)))
    }

    async fn cache_put(&self, cache: &str, url: &str, response: &WebResponse) -> Result<(), CacheError> {
        let cache = self.open(cache).await?;
        let copy = response.0.clone().map_err(js_err)?;
        JsFuture::from(cache.put_with_str(url, &copy))
            .await
            .map_err(js_err)?;
        Ok(())
    }

    async fn cache_add_all(&self, cache: &str, urls: &[String]) -> Result<(), CacheError> {
        let cache = self.open(cache).await?;
        let list: js_sys::Array = urls.iter().map(|u| JsValue::from_str(u)).collect();
        JsFuture::from(cache.add_all_with_str_sequence(&list))
            .await
            .map_err(js_err)?;
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        let caches = self.scope.caches().map_err(js_err)?;
        let keys: js_sys::Array = JsFuture::from(caches.keys())
            .await
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)?;
        Ok(keys.iter().filter_map(|k| k.as_string()).collect())
    }

    async fn cache_delete(&self, cache: &str) -> Result<bool, CacheError> {
        let caches = self.scope.caches().map_err(js_err)?;
        let deleted = JsFuture::from(caches.delete(cache)).await.map_err(js_err)?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn cache_size(&self, cache: &str) -> Result<u64, CacheError> {
        let cache = self.open(cache).await?;
        let requests: js_sys::Array = JsFuture::from(cache.keys())
            .await
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)?;
        let mut total = 0u64;
        for request in requests.iter() {
            let request: web::Request = request.dyn_into().map_err(js_err)?;
            let hit = JsFuture::from(cache.match_with_request(&request))
                .await
                .map_err(js_err)?;
            let Ok(response) = hit.dyn_into::<web::Response>() else {
                continue;
            };
            let blob: web::Blob = JsFuture::from(response.blob().map_err(js_err)?)
                .await
                .map_err(js_err)?
                .dyn_into()
                .map_err(js_err)?;
            total += blob.size() as u64;
        }
        Ok(total)
    }

    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<WebResponse, CacheError> {
        let network = |e: JsValue| CacheError::Network {
            url: url.to_string(),
            reason: format!("{:?}", e),
        };
        let response = JsFuture::from(self.fetch_promise(url, mode))
            .await
            .map_err(network)?;
        Ok(WebResponse(response.dyn_into().map_err(network)?))
    }

    async fn fetch_all(&self, urls: &[String]) -> Vec<Result<WebResponse, CacheError>> {
        let promises: js_sys::Array = urls
            .iter()
            .map(|u| JsValue::from(self.fetch_promise(u, FetchMode::SameOrigin)))
            .collect();
        let settled = match JsFuture::from(js_sys::Promise::all_settled(&promises)).await {
            Ok(v) => js_sys::Array::from(&v),
            Err(e) => {
                return urls
                    .iter()
                    .map(|u| {
                        Err(CacheError::Network {
                            url: u.clone(),
                            reason: format!("{:?}", e),
                        })
                    })
                    .collect()
            }
        };
        urls.iter()
            .zip(settled.iter())
            .map(|(url, outcome)| {
                let field = |name: &str| js_sys::Reflect::get(&outcome, &JsValue::from_str(name));
                let fulfilled = field("status")
                    .ok()
                    .and_then(|s| s.as_string())
                    .map_or(false, |s| s == "fulfilled");
                if fulfilled {
                    if let Some(r) = field("value").ok().and_then(|v| v.dyn_into().ok()) {
                        return Ok(WebResponse(r));
                    }
                }
                Err(CacheError::Network {
                    url: url.clone(),
                    reason: format!("{:?}", field("reason").unwrap_or(JsValue::UNDEFINED)),
                })
            })
            .collect()
    }

    async fn notify_clients(&self, message: &ClientMessage) {
        let Some(payload) = to_js(message) else {
            return;
        };
        let Ok(clients) = JsFuture::from(self.scope.clients().match_all()).await else {
            return;
        };
        for client in js_sys::Array::from(&clients).iter() {
            if let Ok(client) = client.dyn_into::<web::Client>() {
                _ = client.post_message(&payload);
            }
        }
    }

    async fn skip_waiting(&self) -> Result<(), CacheError> {
        JsFuture::from(self.scope.skip_waiting().map_err(js_err)?)
            .await
            .map_err(js_err)?;
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), CacheError> {
        JsFuture::from(self.scope.clients().claim())
            .await
            .map_err(js_err)?;
        Ok(())
    }

    fn text_response(&self, status: u16, body: &str) -> WebResponse {
        let init = web::ResponseInit::new();
        init.set_status(status);
        let headers = web::Headers::new().ok();
        if let Some(h) = &headers {
            _ = h.set("Content-Type", "text/plain");
            init.set_headers(h);
        }
        // null-body statuses reject any body
        let body = if body.is_empty() { None } else { Some(body) };
        let response = web::Response::new_with_opt_str_and_init(body, &init)
            .unwrap_or_else(|_| web::Response::error());
        WebResponse(response)
    }
}

fn router() -> CacheRouter<WebHost> {
    let host = WebHost::current();
    let origin = host.scope.location().origin();
    CacheRouter::new(host, origin)
}

fn request_info(request: &web::Request) -> Option<RequestInfo> {
    let url = web::Url::new(&request.url()).ok()?;
    Some(RequestInfo {
        url: request.url(),
        path: url.pathname(),
        origin: url.origin(),
        method: request.method(),
        navigate: request.mode() == web::RequestMode::Navigate,
    })
}

#[wasm_bindgen]
pub fn sw_install() -> js_sys::Promise {
    future_to_promise(async move {
        lifecycle_outcome("installation", router().install().await)
            .map(|()| JsValue::UNDEFINED)
            .map_err(|e| JsValue::from_str(&e))
    })
}

#[wasm_bindgen]
pub fn sw_activate() -> js_sys::Promise {
    future_to_promise(async move {
        lifecycle_outcome("activation", router().activate().await)
            .map(|()| JsValue::UNDEFINED)
            .map_err(|e| JsValue::from_str(&e))
    })
}

/// `None` leaves the request to the browser.
#[wasm_bindgen]
pub fn sw_fetch(request: web::Request) -> Option<js_sys::Promise> {
    let router = router();
    let info = request_info(&request)?;
    classify(&info, router.origin())?;
    Some(future_to_promise(async move {
        let started = js_sys::Date::now();
        let Some(outcome) = router.respond(&info).await else {
            return Err(JsValue::from_str("request not routed"));
        };
        let elapsed = js_sys::Date::now() - started;
        if is_slow_request(elapsed) {
            log::warn!("[sw] slow request: {} took {:.0}ms", info.url, elapsed);
        }
        if let Some(url) = outcome.background_refresh {
            spawn_local(async move {
                router.refresh_resource(&url).await;
            });
        }
        Ok(outcome.response.0.into())
    }))
}

#[wasm_bindgen]
pub fn sw_message(event: web::ExtendableMessageEvent) -> js_sys::Promise {
    let data = js_sys::JSON::stringify(&event.data())
        .ok()
        .and_then(|s| s.as_string());
    let port = event
        .ports()
        .get(0)
        .dyn_into::<web::MessagePort>()
        .ok();
    future_to_promise(async move {
        let command = match data.as_deref().map(WorkerCommand::parse) {
            Some(Ok(command)) => command,
            Some(Err(e)) => {
                log::info!("[sw] unreadable message: {e}");
                return Ok(JsValue::UNDEFINED);
            }
            None => return Ok(JsValue::UNDEFINED),
        };
        if let Some(reply) = router().handle_message(command).await {
            match (port, to_js(&reply)) {
                (Some(port), Some(payload)) => {
                    _ = port.post_message(&payload);
                }
                _ => log::warn!("[sw] cache size requested without a reply port"),
            }
        }
        Ok(JsValue::UNDEFINED)
    })
}

#[wasm_bindgen]
pub fn sw_sync(tag: String) -> Option<js_sys::Promise> {
    if tag != SYNC_TAG {
        return None;
    }
    Some(future_to_promise(async move {
        log::info!("[sw] background sync");
        router().background_sync().await;
        Ok(JsValue::UNDEFINED)
    }))
}
