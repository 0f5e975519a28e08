use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use http::{header, StatusCode};
use hyper::{Request, Response};
use tracing::{debug, error};

use crate::error::RouterError;
use crate::resource::Resource;
use crate::response::{empty_body, BoxBody};
use crate::routing::trie::Node;
use crate::routing::Params;

/// The methods a route may be registered under. Case-sensitive; anything
/// else is rejected at registration.
pub const ALLOWED_METHODS: [&str; 6] = ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

pub type HandlerFuture = BoxFuture<'static, Response<BoxBody>>;

/// A request handler: called with the request and the path parameters
/// captured during lookup. Cheap to clone and shared across requests.
pub type Handler = Arc<dyn Fn(Request<BoxBody>, Params) -> HandlerFuture + Send + Sync>;

/// Hook invoked on a matched path whose method table lacks the request
/// method; receives the allowed methods.
pub type MethodNotAllowedHandler =
    Arc<dyn Fn(Request<BoxBody>, Vec<String>) -> HandlerFuture + Send + Sync>;

/// Hook invoked with the payload of a panic recovered from a handler. The
/// request was consumed by the panicking handler, so the hook builds the
/// response from the payload alone.
pub type PanicHandler = Arc<dyn Fn(Box<dyn Any + Send>) -> Response<BoxBody> + Send + Sync>;

/// Adapt an async closure into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request<BoxBody>, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<BoxBody>> + Send + 'static,
{
    Arc::new(move |req, params| -> HandlerFuture { Box::pin(f(req, params)) })
}

/// HTTP request router over a compressed radix trie.
///
/// Build-once, read-many: registration needs `&mut Router`, serving works on
/// a shared reference (typically `Arc<Router>`), so the borrow checker seals
/// the route table before the first request and the read path needs no
/// synchronization.
pub struct Router {
    base_url: String,
    root: Node<Handler>,
    /// Resource name -> base path. Names are unique; paths may overlap.
    resources: HashMap<String, String>,
    not_found: Option<Handler>,
    method_not_allowed: Option<MethodNotAllowedHandler>,
    panic_handler: Option<PanicHandler>,
}

impl Router {
    pub fn new(base_url: &str) -> Self {
        Router {
            base_url: base_url.to_string(),
            root: Node::new_root(),
            resources: HashMap::new(),
            not_found: None,
            method_not_allowed: None,
            panic_handler: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register `handler` for `method` on `path`. The path must begin with
    /// `/`; a trailing `/` is ignored, so `/x` and `/x/` are one route.
    pub fn handle(
        &mut self,
        method: &str,
        path: &str,
        handler: Handler,
    ) -> Result<(), RouterError> {
        if !ALLOWED_METHODS.contains(&method) {
            return Err(RouterError::InvalidMethod(method.to_string()));
        }
        if !path.starts_with('/') {
            return Err(RouterError::InvalidPath(path.to_string()));
        }

        let leaf = self.root.add_path(canonical_path(path))?;
        leaf.set_handler(method, handler);
        debug!("router: registered route, method={}, path={}", method, path);
        Ok(())
    }

    pub fn get(&mut self, path: &str, handler: Handler) -> Result<(), RouterError> {
        self.handle("GET", path, handler)
    }

    pub fn post(&mut self, path: &str, handler: Handler) -> Result<(), RouterError> {
        self.handle("POST", path, handler)
    }

    pub fn put(&mut self, path: &str, handler: Handler) -> Result<(), RouterError> {
        self.handle("PUT", path, handler)
    }

    pub fn patch(&mut self, path: &str, handler: Handler) -> Result<(), RouterError> {
        self.handle("PATCH", path, handler)
    }

    pub fn delete(&mut self, path: &str, handler: Handler) -> Result<(), RouterError> {
        self.handle("DELETE", path, handler)
    }

    pub fn options(&mut self, path: &str, handler: Handler) -> Result<(), RouterError> {
        self.handle("OPTIONS", path, handler)
    }

    /// Bulk-register a [`Resource`]: every accumulated route lands at
    /// `base_path + pattern`. The resource name must not have been used on
    /// this router before.
    pub fn add_resource(&mut self, name: &str, resource: Resource) -> Result<(), RouterError> {
        if self.resources.contains_key(name) {
            return Err(RouterError::DuplicateResource(name.to_string()));
        }

        let (base_path, routes) = resource.into_parts();
        for (method, pattern, handler) in routes {
            let full = format!("{}{}", base_path, pattern);
            self.handle(&method, &full, handler)?;
        }
        self.resources.insert(name.to_string(), base_path);
        Ok(())
    }

    pub fn set_not_found_handler(&mut self, handler: Handler) {
        self.not_found = Some(handler);
    }

    pub fn set_method_not_allowed_handler(&mut self, handler: MethodNotAllowedHandler) {
        self.method_not_allowed = Some(handler);
    }

    pub fn set_panic_handler(&mut self, handler: PanicHandler) {
        self.panic_handler = Some(handler);
    }

    /// The HTTP entry point: route the request and run its handler, or
    /// answer 404 / 405.
    pub async fn dispatch(&self, req: Request<BoxBody>) -> Response<BoxBody> {
        let method = req.method().as_str().to_string();
        let request_path = req.uri().path().to_string();

        let (node, params) = self.root.find(canonical_path(&request_path));

        match node {
            Some(node) if !node.handlers.is_empty() => {
                if let Some(handler) = node.handlers.get(&method) {
                    let handler = handler.clone();
                    return self.invoke(handler, req, params).await;
                }

                let mut allowed: Vec<String> = node.handlers.keys().cloned().collect();
                allowed.sort_unstable();
                debug!(
                    "router: method not allowed, method={}, path={}, allowed={:?}",
                    method, request_path, allowed
                );
                if let Some(hook) = &self.method_not_allowed {
                    return hook(req, allowed).await;
                }
                Response::builder()
                    .status(StatusCode::METHOD_NOT_ALLOWED)
                    .header(header::ALLOW, allowed.join(", "))
                    .body(empty_body())
                    .unwrap()
            }
            _ => {
                debug!(
                    "router: no route matched, method={}, path={}",
                    method, request_path
                );
                if let Some(hook) = &self.not_found {
                    return hook(req, params).await;
                }
                Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(empty_body())
                    .unwrap()
            }
        }
    }

    /// Run the handler, recovering panics when a panic hook is installed.
    /// Without a hook, panics propagate to the host server.
    async fn invoke(
        &self,
        handler: Handler,
        req: Request<BoxBody>,
        params: Params,
    ) -> Response<BoxBody> {
        match &self.panic_handler {
            Some(hook) => match AssertUnwindSafe(handler(req, params)).catch_unwind().await {
                Ok(resp) => resp,
                Err(payload) => {
                    error!("router: handler panicked, recovering through panic hook");
                    hook(payload)
                }
            },
            None => handler(req, params).await,
        }
    }
}

/// Canonical trie form of a path: leading `/` stripped (the root owns it),
/// one trailing `/` stripped when the path is longer than `/`.
fn canonical_path(path: &str) -> &str {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}
