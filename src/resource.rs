use crate::router::Handler;

/// Grouping sugar for a REST-style resource: a base path plus the routes
/// hanging off it. Registered in bulk with
/// [`Router::add_resource`](crate::Router::add_resource), where every
/// accumulated pattern becomes a route at `base_path + pattern`.
///
/// ```
/// use trellis::{handler_fn, respond_json, Resource};
/// use http::StatusCode;
///
/// let posts = Resource::new("/posts")
///     .get("", handler_fn(|_req, _params| async {
///         respond_json(StatusCode::OK, &["first", "second"])
///     }))
///     .delete("/:post_id", handler_fn(|_req, params| {
///         let id = params.get("post_id").unwrap_or("").to_string();
///         async move { respond_json(StatusCode::OK, &id) }
///     }));
/// ```
pub struct Resource {
    base_path: String,
    routes: Vec<(String, String, Handler)>,
}

impl Resource {
    pub fn new(base_path: &str) -> Self {
        Resource {
            base_path: base_path.to_string(),
            routes: Vec::new(),
        }
    }

    /// Add a route under the base path. The method is validated when the
    /// resource is registered into a router.
    pub fn route(mut self, method: &str, pattern: &str, handler: Handler) -> Self {
        self.routes
            .push((method.to_string(), pattern.to_string(), handler));
        self
    }

    pub fn get(self, pattern: &str, handler: Handler) -> Self {
        self.route("GET", pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: Handler) -> Self {
        self.route("POST", pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: Handler) -> Self {
        self.route("PUT", pattern, handler)
    }

    pub fn patch(self, pattern: &str, handler: Handler) -> Self {
        self.route("PATCH", pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: Handler) -> Self {
        self.route("DELETE", pattern, handler)
    }

    pub fn options(self, pattern: &str, handler: Handler) -> Self {
        self.route("OPTIONS", pattern, handler)
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub(crate) fn into_parts(self) -> (String, Vec<(String, String, Handler)>) {
        (self.base_path, self.routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::empty_body;
    use http::StatusCode;
    use hyper::Response;

    fn noop() -> Handler {
        crate::router::handler_fn(|_req, _params| async {
            Response::builder()
                .status(StatusCode::OK)
                .body(empty_body())
                .unwrap()
        })
    }

    #[test]
    fn test_routes_accumulate_under_base_path() {
        let resource = Resource::new("/posts")
            .get("", noop())
            .post("/:post_id", noop())
            .route("DELETE", "/:post_id", noop());

        assert_eq!(resource.base_path(), "/posts");
        let (base, routes) = resource.into_parts();
        assert_eq!(base, "/posts");

        let entries: Vec<(&str, &str)> = routes
            .iter()
            .map(|(m, p, _)| (m.as_str(), p.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![("GET", ""), ("POST", "/:post_id"), ("DELETE", "/:post_id")]
        );
    }
}
