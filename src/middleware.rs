use std::sync::Arc;

use crate::router::Handler;

/// A handler wrapper. Middlewares are applied once at registration time;
/// nothing is rebuilt per request.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Adapt a closure into a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An ordered set of middlewares. `then` folds them around a terminal
/// handler from right to left, so the first middleware in the chain is the
/// outermost wrapper: it sees the request first and the response last.
#[derive(Clone, Default)]
pub struct Chain {
    middlewares: Vec<Middleware>,
}

impl Chain {
    pub fn new(middlewares: Vec<Middleware>) -> Self {
        Chain { middlewares }
    }

    pub fn then(&self, handler: Handler) -> Handler {
        let mut wrapped = handler;
        for middleware in self.middlewares.iter().rev() {
            wrapped = middleware(wrapped);
        }
        wrapped
    }
}
