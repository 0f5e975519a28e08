//! Compressed radix-trie HTTP router.
//!
//! trellis dispatches an incoming request (method + path) to a registered
//! handler, extracting named path parameters along the way. Routes are
//! literal segments mixed with `:name` wildcards; lookup walks a
//! priority-ordered prefix trie in roughly O(path length) and static
//! segments always win over a wildcard at the same level, so `/users/me`
//! stays reachable next to `/users/:id`.
//!
//! Registration happens on `&mut Router`; serving happens on a shared
//! `Arc<Router>`. The borrow checker seals the route table before the first
//! request, so the hot path carries no locks.
//!
//! ```
//! use http::{Request, StatusCode};
//! use trellis::{empty_body, handler_fn, respond_json, Router};
//!
//! let mut router = Router::new("https://api.example.com/");
//! router
//!     .get("/users/:id", handler_fn(|_req, params| {
//!         let id = params.get("id").unwrap_or("").to_string();
//!         async move { respond_json(StatusCode::OK, &serde_json::json!({ "id": id })) }
//!     }))
//!     .unwrap();
//!
//! let req = Request::builder()
//!     .method("GET")
//!     .uri("/users/42")
//!     .body(empty_body())
//!     .unwrap();
//! let resp = tokio_test::block_on(router.dispatch(req));
//! assert_eq!(resp.status(), StatusCode::OK);
//! ```
//!
//! The [`Server`] type is a minimal hosting loop (hyper, HTTP/1 + HTTP/2)
//! for running a router standalone; the router is equally usable as a plain
//! async function inside any hyper-based server.

pub mod error;
pub mod middleware;
pub mod resource;
pub mod response;
pub mod router;
pub mod routing;
pub mod server;
pub mod settings;

pub use error::RouterError;
pub use middleware::{middleware_fn, Chain, Middleware};
pub use resource::Resource;
pub use response::{empty_body, error, full_body, respond_json, ApiError, BoxBody};
pub use router::{
    handler_fn, Handler, HandlerFuture, MethodNotAllowedHandler, PanicHandler, Router,
    ALLOWED_METHODS,
};
pub use routing::{Param, Params};
pub use server::Server;
pub use settings::load_settings;
