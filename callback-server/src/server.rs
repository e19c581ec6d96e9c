//! HTTP server for receiving UPnP event notifications.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::Filter;

use crate::error::CallbackError;
use crate::router::{EventRouter, NotifyDecoder};

/// Callback path used when the caller does not choose one
pub const DEFAULT_CALLBACK_PATH: &str = "/sonos/events";

/// HTTP callback server for receiving UPnP event notifications.
///
/// The server binds an ephemeral port on one local address and accepts
/// `NOTIFY` requests on a single path. Bodies are handed to an
/// [`EventRouter`]; the HTTP answer never depends on whether the event could
/// be decoded or queued.
///
/// # Example
///
/// ```no_run
/// # use std::net::{IpAddr, Ipv4Addr};
/// # use std::time::Duration;
/// # use tokio::sync::mpsc;
/// # use callback_server::{CallbackServer, EventRouter, NotifyDecoder};
/// # struct Raw;
/// # impl NotifyDecoder for Raw {
/// #     type Event = String;
/// #     type Error = std::convert::Infallible;
/// #     fn decode(&self, body: &str) -> Result<String, Self::Error> { Ok(body.to_string()) }
/// # }
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (tx, mut rx) = mpsc::channel(16);
/// let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
/// let server = CallbackServer::bind(ip, "/sonos/events", EventRouter::new(Raw, tx))?;
/// println!("subscribe with {}", server.callback_url());
///
/// while let Some(body) = rx.recv().await {
///     println!("{body}");
/// }
/// server.shutdown(Duration::from_secs(5)).await?;
/// # Ok(())
/// # }
/// ```
pub struct CallbackServer {
    local_addr: SocketAddr,
    callback_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    exit_rx: Option<oneshot::Receiver<()>>,
    server_handle: JoinHandle<()>,
}

impl CallbackServer {
    /// Bind `ip:0` and start serving `callback_path`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind<D: NotifyDecoder>(
        ip: IpAddr,
        callback_path: &str,
        router: EventRouter<D>,
    ) -> Result<Self, CallbackError> {
        let callback_path: Arc<str> = normalize_path(callback_path).into();

        let notify_route = warp::method()
            .and(warp::path::full())
            .and(warp::header::optional::<String>("sid"))
            .and(warp::body::bytes())
            .map({
                let callback_path = Arc::clone(&callback_path);
                move |method: Method, path: FullPath, sid: Option<String>, body: Bytes| {
                    handle_notify(&router, &callback_path, &method, path.as_str(), sid.as_deref(), &body)
                }
            })
            .recover(handle_rejection);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (local_addr, server) = warp::serve(notify_route)
            .try_bind_with_graceful_shutdown(SocketAddr::new(ip, 0), async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|e| CallbackError::Bind(format!("{ip}:0: {e}")))?;

        let (exit_tx, exit_rx) = oneshot::channel::<()>();
        let server_handle = tokio::spawn(async move {
            server.await;
            let _ = exit_tx.send(());
        });

        let callback_url = format!("http://{}{}", local_addr, callback_path);
        info!(%local_addr, url = %callback_url, "callback server listening");

        Ok(Self {
            local_addr,
            callback_url,
            shutdown_tx: Some(shutdown_tx),
            exit_rx: Some(exit_rx),
            server_handle,
        })
    }

    /// Full URL to hand to the device in the `CALLBACK` header
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolves once the serving task has ended for any reason.
    ///
    /// Before [`shutdown`](Self::shutdown) this means the server failed.
    /// After it has resolved once, later calls never resolve.
    pub async fn terminated(&mut self) {
        match self.exit_rx.as_mut() {
            Some(exit_rx) => {
                let _ = exit_rx.await;
                self.exit_rx = None;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Stop accepting requests and wait up to `timeout` for in-flight ones.
    pub async fn shutdown(mut self, timeout: Duration) -> Result<(), CallbackError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        match tokio::time::timeout(timeout, &mut self.server_handle).await {
            Ok(_) => {
                debug!(local_addr = %self.local_addr, "callback server stopped");
                Ok(())
            }
            Err(_) => {
                self.server_handle.abort();
                Err(CallbackError::Shutdown(format!(
                    "not stopped after {:?}",
                    timeout
                )))
            }
        }
    }
}

/// Local address the OS would use to reach `remote`.
///
/// No packet is sent: connecting a UDP socket only selects a route.
pub fn local_ip_for(remote: SocketAddr) -> Result<IpAddr, CallbackError> {
    let bind_addr = if remote.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(bind_addr).map_err(|e| CallbackError::LocalAddress(e.to_string()))?;
    socket
        .connect(remote)
        .map_err(|e| CallbackError::LocalAddress(format!("dial {remote}: {e}")))?;

    let ip = socket
        .local_addr()
        .map_err(|e| CallbackError::LocalAddress(e.to_string()))?
        .ip()
        .to_canonical();

    if ip.is_unspecified() {
        return Err(CallbackError::LocalAddress(
            "resolved unspecified IP".to_string(),
        ));
    }
    Ok(ip)
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn handle_notify<D: NotifyDecoder>(
    router: &EventRouter<D>,
    callback_path: &str,
    method: &Method,
    path: &str,
    sid: Option<&str>,
    body: &Bytes,
) -> StatusCode {
    if path != callback_path {
        debug!(path, "request for unknown callback path");
        return StatusCode::NOT_FOUND;
    }
    if method.as_str() != "NOTIFY" {
        debug!(%method, "rejecting non-NOTIFY callback request");
        return StatusCode::METHOD_NOT_ALLOWED;
    }

    let body = String::from_utf8_lossy(body);
    router.route(sid, &body);
    StatusCode::OK
}

/// Body read failures and malformed headers end up here.
async fn handle_rejection(err: warp::Rejection) -> Result<StatusCode, Infallible> {
    if err.is_not_found() {
        return Ok(StatusCode::NOT_FOUND);
    }
    warn!(error = ?err, "failed to read event notification");
    Ok(StatusCode::INTERNAL_SERVER_ERROR)
}
