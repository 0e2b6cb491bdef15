//! TCP accept loop: one task and one request per connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use vg_types::{HttpError, VgResult};

use crate::config::ServiceConfig;
use crate::http::{parse_request, Request, Response};
use crate::routes::{ErrorBody, Service};

/// How often expired rate-limit windows are dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);
const READ_CHUNK: usize = 4096;

/// Bind the configured address and serve until `shutdown` completes.
pub async fn run<F>(config: ServiceConfig, shutdown: F) -> VgResult<()>
where
    F: Future<Output = ()>,
{
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let service = Arc::new(Service::new(&config));
    serve(listener, service, config.request_timeout, shutdown).await
}

/// Serve connections from an already bound listener.
pub async fn serve<F>(
    listener: TcpListener,
    service: Arc<Service>,
    read_timeout: Duration,
    shutdown: F,
) -> VgResult<()>
where
    F: Future<Output = ()>,
{
    info!(addr = %listener.local_addr()?, "Vigil risk service listening");

    let mut prune = tokio::time::interval(PRUNE_INTERVAL);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            _ = prune.tick() => {
                let removed = service.limiter().prune(Instant::now());
                if removed > 0 {
                    debug!(removed, "Pruned expired rate-limit windows");
                }
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, peer)) => {
                        let service = Arc::clone(&service);
                        tokio::spawn(handle_connection(socket, peer, service, read_timeout));
                    }
                    Err(e) => warn!(error = %e, "Failed to accept connection"),
                }
            }
        }
    }

    Ok(())
}

async fn handle_connection(
    mut socket: TcpStream,
    peer: SocketAddr,
    service: Arc<Service>,
    read_timeout: Duration,
) {
    let span = info_span!("request", id = %Uuid::new_v4(), %peer);

    async move {
        let read = read_request(&mut socket, service.max_body_bytes());
        let response = match tokio::time::timeout(read_timeout, read).await {
            Ok(Ok(request)) => {
                debug!(method = %request.method, path = %request.path, "Request received");
                let response = service.handle(&request, peer.ip());
                info!(
                    method = %request.method,
                    path = %request.path,
                    status = response.status,
                    "Request completed"
                );
                response
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read request");
                service.error_response(&e)
            }
            Err(_) => {
                warn!(timeout_ms = read_timeout.as_millis() as u64, "Timed out reading request");
                Response::json(408, &ErrorBody::new("Request timeout"))
            }
        };

        if let Err(e) = socket.write_all(&response.to_bytes()).await {
            debug!(error = %e, "Failed to write response");
        }
        let _ = socket.shutdown().await;
    }
    .instrument(span)
    .await
}

/// Read until a complete request has arrived.
async fn read_request<S>(stream: &mut S, max_body: usize) -> VgResult<Request>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        if let Some(request) = parse_request(&buf, max_body)? {
            return Ok(request);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(HttpError::ConnectionClosed.into());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}
