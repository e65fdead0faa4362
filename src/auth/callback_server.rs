//! Local HTTP callback server for OAuth authentication.
//!
//! Listens on the loopback address named by the redirect URL, receives the
//! single OAuth redirect, shows the user a short result page and hands the
//! full callback URL back to the credential.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use url::Url;

use crate::error::AuthError;

/// Result from the callback server.
#[derive(Debug)]
pub enum CallbackResult {
    /// Successfully received callback with the full URL.
    Success(String),
    /// Server was cancelled.
    Cancelled,
    /// No callback arrived before the deadline.
    TimedOut,
    /// Error occurred.
    Error(String),
}

/// A bound, not yet waiting, callback listener.
pub struct CallbackServer {
    listener: TcpListener,
    host: String,
    port: u16,
    path: String,
}

impl CallbackServer {
    /// Bind the listener for `redirect`.
    ///
    /// Binding happens before the browser is opened so the redirect can never
    /// race the listener.
    pub fn bind(redirect: &Url) -> Result<Self, AuthError> {
        let host = redirect
            .host_str()
            .ok_or_else(|| AuthError::CallbackServer("Redirect URL has no host".into()))?
            .to_string();
        let port = redirect
            .port_or_known_default()
            .ok_or_else(|| AuthError::CallbackServer("Redirect URL has no port".into()))?;

        let bind_host = match host.as_str() {
            "localhost" => "127.0.0.1",
            "[::1]" => "::1",
            other => other,
        };

        let listener = TcpListener::bind((bind_host, port)).map_err(|e| {
            error!("Failed to bind callback server to {}:{}: {}", bind_host, port, e);
            AuthError::CallbackServer(format!("Failed to start server: {}", e))
        })?;

        // Non-blocking so cancellation and the deadline are observed
        listener
            .set_nonblocking(true)
            .map_err(|e| AuthError::CallbackServer(format!("Server configuration error: {}", e)))?;

        // Port 0 asks the OS for a free port; report the one we actually got
        let port = listener.local_addr().map(|a| a.port()).unwrap_or(port);

        info!("OAuth callback server listening on {}:{}", bind_host, port);

        Ok(Self {
            listener,
            host,
            port,
            path: redirect.path().to_string(),
        })
    }

    /// The port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for a single OAuth callback.
    ///
    /// Returns the full callback URL (including query parameters) when received.
    /// The server shuts down after the callback, on cancellation or once
    /// `timeout` has elapsed. `None` waits until the callback or a cancel.
    pub fn wait_for_callback(
        self,
        cancel_rx: mpsc::Receiver<()>,
        timeout: Option<Duration>,
    ) -> CallbackResult {
        let started = Instant::now();

        loop {
            match cancel_rx.try_recv() {
                Ok(()) | Err(mpsc::TryRecvError::Disconnected) => {
                    info!("Callback server cancelled");
                    return CallbackResult::Cancelled;
                }
                Err(mpsc::TryRecvError::Empty) => {}
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    info!("Callback server timed out after {:?}", limit);
                    return CallbackResult::TimedOut;
                }
            }

            match self.listener.accept() {
                Ok((stream, peer_addr)) => {
                    debug!("Connection from {}", peer_addr);
                    if let Some(url) = self.handle_connection(stream) {
                        info!("OAuth callback received");
                        return CallbackResult::Success(url);
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    return CallbackResult::Error(format!("Connection error: {}", e));
                }
            }
        }
    }

    /// Handle an incoming HTTP connection.
    ///
    /// Returns Some(url) if this was a valid OAuth callback, None otherwise.
    fn handle_connection(&self, mut stream: TcpStream) -> Option<String> {
        // Accepted sockets inherit non-blocking mode on some platforms
        let _ = stream.set_nonblocking(false);
        let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

        let mut buffer = [0; 4096];
        let bytes_read = match stream.read(&mut buffer) {
            Ok(n) => n,
            Err(e) => {
                debug!("Failed to read request: {}", e);
                return None;
            }
        };

        let request = String::from_utf8_lossy(&buffer[..bytes_read]);
        let request_line = request.lines().next()?;
        debug!("Received request: {}", request_line);

        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() < 2 {
            send_response(&mut stream, 400, "Bad Request", "text/plain", "Bad Request");
            return None;
        }

        let method = parts[0];
        let target = parts[1];

        if method != "GET" {
            send_response(&mut stream, 405, "Method Not Allowed", "text/plain", "Method Not Allowed");
            return None;
        }

        let request_path = target.split('?').next().unwrap_or_default();
        if request_path != self.path {
            send_response(&mut stream, 404, "Not Found", "text/plain", "Not Found");
            return None;
        }

        let callback_url = format!("http://{}:{}{}", self.host, self.port, target);

        if target.contains("error=") {
            send_response(&mut stream, 200, "OK", "text/html; charset=utf-8", &error_page(target));
            // The credential turns the error parameters into a proper error
            return Some(callback_url);
        }

        if !target.contains("code=") {
            send_response(&mut stream, 400, "Bad Request", "text/plain", "Missing authorization code");
            return None;
        }

        send_response(&mut stream, 200, "OK", "text/html; charset=utf-8", SUCCESS_PAGE);

        Some(callback_url)
    }
}

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Authentication Successful</title>
    <style>
        body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; text-align: center; padding-top: 4rem; }
        h1 { color: #1F2937; }
        p { color: #6B7280; }
    </style>
</head>
<body>
    <h1>Authentication Successful</h1>
    <p>azuretenants received your sign-in. You can close this tab now.</p>
</body>
</html>"#;

/// Build the HTML shown when the identity provider redirected with an error.
fn error_page(target: &str) -> String {
    let error_desc = match target.find("error_description=") {
        Some(start) => {
            let start = start + "error_description=".len();
            let end = target[start..]
                .find('&')
                .map(|i| start + i)
                .unwrap_or(target.len());
            urlencoding::decode(&target[start..end].replace('+', " "))
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| "Authentication failed".to_string())
        }
        None => "Authentication was cancelled or failed.".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Authentication Failed</title>
    <style>
        body {{ font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; text-align: center; padding-top: 4rem; }}
        h1 {{ color: #B91C1C; }}
        p {{ color: #6B7280; }}
    </style>
</head>
<body>
    <h1>Authentication Failed</h1>
    <p>{}</p>
    <p>You can close this tab.</p>
</body>
</html>"#,
        html_escape(&error_desc)
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn send_response(stream: &mut TcpStream, status: u16, reason: &str, content_type: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        content_type,
        body.len(),
        body
    );

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
