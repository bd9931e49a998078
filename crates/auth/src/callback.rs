//! Local HTTP callback listener for the authorize redirect.
//!
//! Binds a TCP listener on the loopback port of the configured redirect URI,
//! waits for the identity provider to redirect the browser back, and extracts
//! `code` / `error` from the request line.

use jobtrackr_types::{AuthError, CallbackParams, error::Result};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const SUCCESS_HTML: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Signed in to JobTrackr</h1><p>You may close this tab.</p></body></html>";
const DENIED_HTML: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Sign-in was not completed</h1><p>You may close this tab.</p></body></html>";
const NOT_FOUND: &[u8] = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// Bind the local callback port and return the listener.
///
/// The caller should bind the port **before** opening the browser so the
/// redirect cannot race the listener.
///
/// # Errors
///
/// Returns [`AuthError::Config`] if the port is in use or cannot be bound.
pub async fn bind_callback(port: u16) -> Result<TcpListener> {
    let addr = format!("127.0.0.1:{port}");
    TcpListener::bind(&addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            AuthError::Config(format!(
                "callback port {port} is already in use; close the other process and retry"
            ))
        } else {
            AuthError::Config(format!("cannot bind callback port {port}: {e}"))
        }
    })
}

/// Wait for the redirect to `path` on an already-bound listener.
///
/// Requests for other paths (e.g. `/favicon.ico`) are answered with 404 and
/// ignored. Giving up after `timeout` is reported as
/// [`AuthError::AuthorizationDenied`], the user having abandoned the flow.
///
/// # Errors
///
/// Returns an error on accept failure, malformed query, or timeout.
pub async fn accept_callback(
    listener: TcpListener,
    path: &str,
    timeout: Duration,
) -> Result<CallbackParams> {
    let accept = async {
        loop {
            let (mut stream, _) = listener
                .accept()
                .await
                .map_err(|e| AuthError::AuthorizationDenied(format!("callback listener failed: {e}")))?;

            let Some(request) = read_request(&mut stream).await else {
                continue;
            };
            let (req_path, query) = split_target(&request);
            if req_path != path {
                let _ = stream.write_all(NOT_FOUND).await;
                continue;
            }

            let params = CallbackParams::from_query(query)
                .map_err(|e| AuthError::AuthorizationDenied(format!("invalid callback query: {e}")))?;
            let page = if params.code.is_some() {
                SUCCESS_HTML
            } else {
                DENIED_HTML
            };
            let _ = stream.write_all(page).await;
            let _ = stream.shutdown().await;
            return Ok::<CallbackParams, AuthError>(params);
        }
    };

    tokio::time::timeout(timeout, accept).await.map_err(|_| {
        AuthError::AuthorizationDenied("timed out waiting for the sign-in redirect".into())
    })?
}

async fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await.ok()?;
    Some(String::from_utf8_lossy(&buf[..n]).into_owned())
}

/// Split `"GET /callback?code=… HTTP/1.1"` into path and query.
fn split_target(request: &str) -> (&str, &str) {
    let first_line = request.lines().next().unwrap_or("");
    let target = first_line.split_ascii_whitespace().nth(1).unwrap_or("/");
    target.split_once('?').unwrap_or((target, ""))
}
