//! Loopback redirect consent prompt
//!
//! Binds an ephemeral port on 127.0.0.1, asks the user to open the
//! authorization URL and waits for the browser to be redirected back.

use async_trait::async_trait;
use bridge_traits::{
    consent::{AuthorizationPrompt, AuthorizationResponse},
    error::{BridgeError, Result},
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

const SUCCESS_PAGE: &str = "<html><body><h3>Authorization complete.</h3>\
<p>You can close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><h3>Authorization was not granted.</h3>\
<p>Return to the terminal for details.</p></body></html>";

/// Consent prompt that receives the OAuth redirect on a local port
pub struct LoopbackAuthorizationPrompt {
    listener: Mutex<TcpListener>,
    addr: SocketAddr,
    wait_timeout: Duration,
    read_timeout: Duration,
}

impl LoopbackAuthorizationPrompt {
    /// Bind an ephemeral loopback port
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        debug!(%addr, "Loopback redirect listener bound");

        Ok(Self {
            listener: Mutex::new(listener),
            addr,
            wait_timeout: Duration::from_secs(300),
            read_timeout: Duration::from_secs(5),
        })
    }

    /// How long to wait for the browser redirect
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// How long one connection may stay silent before it is dropped
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Read one request and return its query string, if the path carries one
    async fn read_redirect(stream: &mut TcpStream) -> Result<Option<String>> {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;

        // Drain headers so the browser sees a clean response
        loop {
            let mut line = String::new();
            let read = reader.read_line(&mut line).await?;
            if read == 0 || line == "\r\n" || line == "\n" {
                break;
            }
        }

        Ok(parse_request_target(&request_line))
    }

    async fn respond(stream: &mut TcpStream, body: &str) -> Result<()> {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }

    /// Answer one connection; `Some` when it carried the OAuth redirect
    async fn serve(mut stream: TcpStream, read_timeout: Duration) -> Option<AuthorizationResponse> {
        let query = match tokio::time::timeout(read_timeout, Self::read_redirect(&mut stream)).await
        {
            Ok(Ok(query)) => query,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read redirect request");
                return None;
            }
            Err(_) => {
                debug!("Connection sent no request, dropping it");
                return None;
            }
        };

        let response = query
            .map(|q| AuthorizationResponse::from_query(&q))
            .unwrap_or_default();

        // Favicon and other stray requests carry neither field
        if response.code.is_none() && response.error.is_none() {
            let _ = Self::respond(&mut stream, FAILURE_PAGE).await;
            return None;
        }

        let page = if response.code.is_some() {
            SUCCESS_PAGE
        } else {
            FAILURE_PAGE
        };
        if let Err(e) = Self::respond(&mut stream, page).await {
            warn!(error = %e, "Failed to answer redirect request");
        }

        Some(response)
    }

    /// Serve every connection in its own task until one carries the redirect
    ///
    /// Browsers open speculative connections that never send a request; those
    /// must not hold up the real one.
    async fn wait_for_redirect(&self) -> Result<AuthorizationResponse> {
        let listener = self.listener.lock().await;
        let (tx, mut rx) = mpsc::channel(1);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    debug!(%peer, "Accepted redirect connection");

                    let tx = tx.clone();
                    let read_timeout = self.read_timeout;
                    tokio::spawn(async move {
                        if let Some(response) = Self::serve(stream, read_timeout).await {
                            let _ = tx.send(response).await;
                        }
                    });
                }
                Some(response) = rx.recv() => return Ok(response),
            }
        }
    }
}

/// Extract the query of `GET /path?query HTTP/1.1`
fn parse_request_target(request_line: &str) -> Option<String> {
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    let target = parts.next()?;
    target
        .split_once('?')
        .map(|(_, query)| query.to_string())
}

#[async_trait]
impl AuthorizationPrompt for LoopbackAuthorizationPrompt {
    fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}", self.addr.port())
    }

    async fn authorize(&self, auth_url: &str) -> Result<AuthorizationResponse> {
        eprintln!("Please visit this URL to authorize this application:\n\n{auth_url}\n");
        info!(redirect_uri = %self.redirect_uri(), "Waiting for authorization redirect");

        tokio::time::timeout(self.wait_timeout, self.wait_for_redirect())
            .await
            .map_err(|_| {
                BridgeError::OperationFailed(format!(
                    "No authorization redirect received within {}s",
                    self.wait_timeout.as_secs()
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_parse_request_target() {
        assert_eq!(
            parse_request_target("GET /?code=abc&state=xyz HTTP/1.1\r\n"),
            Some("code=abc&state=xyz".to_string())
        );
        assert_eq!(parse_request_target("GET /favicon.ico HTTP/1.1\r\n"), None);
        assert_eq!(parse_request_target(""), None);
    }

    #[tokio::test]
    async fn test_redirect_uri_uses_bound_port() {
        let prompt = LoopbackAuthorizationPrompt::bind().await.unwrap();
        assert_eq!(
            prompt.redirect_uri(),
            format!("http://127.0.0.1:{}", prompt.addr.port())
        );
    }

    #[tokio::test]
    async fn test_authorize_receives_code() {
        let prompt = LoopbackAuthorizationPrompt::bind().await.unwrap();
        let addr = prompt.addr;

        let browser = tokio::spawn(async move {
            // Stray request first, then the real redirect
            let mut favicon = TcpStream::connect(addr).await.unwrap();
            favicon
                .write_all(b"GET /favicon.ico HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            let mut sink = Vec::new();
            favicon.read_to_end(&mut sink).await.unwrap();

            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET /?state=s1&code=4%2Fabc HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            let mut page = String::new();
            stream.read_to_string(&mut page).await.unwrap();
            page
        });

        let response = prompt.authorize("https://accounts.example/auth").await.unwrap();
        assert_eq!(response.code.as_deref(), Some("4/abc"));
        assert_eq!(response.state.as_deref(), Some("s1"));

        let page = browser.await.unwrap();
        assert!(page.starts_with("HTTP/1.1 200 OK"));
        assert!(page.contains("Authorization complete"));
    }

    #[tokio::test]
    async fn test_authorize_times_out() {
        let prompt = LoopbackAuthorizationPrompt::bind()
            .await
            .unwrap()
            .with_wait_timeout(Duration::from_millis(20));

        let result = prompt.authorize("https://accounts.example/auth").await;
        assert!(matches!(result, Err(BridgeError::OperationFailed(_))));
    }

    #[tokio::test]
    async fn test_silent_connection_does_not_block_redirect() {
        let prompt = LoopbackAuthorizationPrompt::bind()
            .await
            .unwrap()
            .with_wait_timeout(Duration::from_secs(2));
        let addr = prompt.addr;

        let browser = tokio::spawn(async move {
            // Preconnect that never sends anything
            let idle = TcpStream::connect(addr).await.unwrap();

            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET /?state=s&code=c HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            let mut page = String::new();
            stream.read_to_string(&mut page).await.unwrap();
            drop(idle);
            page
        });

        let response = prompt.authorize("https://accounts.example/auth").await.unwrap();
        assert_eq!(response.code.as_deref(), Some("c"));
        assert_eq!(response.state.as_deref(), Some("s"));
        assert!(browser.await.unwrap().contains("Authorization complete"));
    }

    #[tokio::test]
    async fn test_silent_connection_is_dropped_after_read_timeout() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _idle = TcpStream::connect(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();

        let served =
            LoopbackAuthorizationPrompt::serve(stream, Duration::from_millis(50)).await;
        assert!(served.is_none());
    }
}
