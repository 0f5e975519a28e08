use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info};

use crate::router::Router;

/// Hosting loop that plugs a [`Router`] into hyper: accepts TCP
/// connections, serves HTTP/1 and HTTP/2 on each, and hands every request
/// to [`Router::dispatch`].
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Bind the listen address without accepting yet, so the caller can read
    /// the resolved port (e.g. when binding `:0`).
    pub async fn bind(listen: &str) -> Result<Self> {
        let addr: SocketAddr = listen.parse()?;
        let listener = TcpListener::bind(addr).await?;
        Ok(Server { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve connections until `shutdown` is notified. Each
    /// connection runs on its own task; in-flight requests on already
    /// accepted connections are unaffected by shutdown.
    pub async fn serve(self, router: Arc<Router>, shutdown: Arc<Notify>) -> Result<()> {
        info!("server: listening, addr={}", self.listener.local_addr()?);

        loop {
            let accepted = tokio::select! {
                result = self.listener.accept() => result,
                _ = shutdown.notified() => {
                    info!("server: stop accepting new connections");
                    break;
                }
            };

            let (stream, peer_addr) = match accepted {
                Ok(v) => v,
                Err(e) => {
                    error!("server: accept failed, error={}", e);
                    continue;
                }
            };

            let router = router.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let router_inner = router.clone();
                let svc = service_fn(move |req: Request<Incoming>| {
                    let router = router_inner.clone();
                    async move {
                        let req = req.map(|body| body.boxed());
                        Ok::<_, Infallible>(router.dispatch(req).await)
                    }
                });

                if let Err(e) = auto::Builder::new(TokioExecutor::new())
                    .serve_connection_with_upgrades(io, svc)
                    .await
                {
                    if !e.to_string().contains("connection closed") {
                        error!(
                            "server: connection error, peer={}, error={}",
                            peer_addr, e
                        );
                    }
                }
            });
        }

        Ok(())
    }
}
