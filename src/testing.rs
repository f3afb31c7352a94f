//! In-process HTTP stub for fetcher and app tests.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl StubResponse {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: Some("text/html"),
            body: body.as_bytes().to_vec(),
            delay: Duration::ZERO,
        }
    }
}

pub struct StubServer {
    /// Embed endpoint URL pointing at the stub.
    pub base_url: String,
    /// Raw request head of every request received, in arrival order.
    pub requests: mpsc::UnboundedReceiver<String>,
    /// One message per response written (or abandoned by the client).
    pub served: mpsc::UnboundedReceiver<()>,
}

/// Serve `response` to every connection on an ephemeral loopback port.
pub async fn serve(response: StubResponse) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    let (req_tx, req_rx) = mpsc::unbounded_channel();
    let (served_tx, served_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            let response = response.clone();
            let req_tx = req_tx.clone();
            let served_tx = served_tx.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&chunk[..n]),
                    }
                }
                let _ = req_tx.send(String::from_utf8_lossy(&head).into_owned());

                tokio::time::sleep(response.delay).await;

                let reason = match response.status {
                    200 => "OK",
                    404 => "Not Found",
                    500 => "Internal Server Error",
                    _ => "Status",
                };
                let mut out = format!("HTTP/1.1 {} {reason}\r\n", response.status);
                if let Some(ct) = response.content_type {
                    out.push_str(&format!("Content-Type: {ct}\r\n"));
                }
                out.push_str(&format!(
                    "Content-Length: {}\r\nConnection: close\r\n\r\n",
                    response.body.len()
                ));
                let _ = sock.write_all(out.as_bytes()).await;
                let _ = sock.write_all(&response.body).await;
                let _ = sock.shutdown().await;
                let _ = served_tx.send(());
            });
        }
    });

    StubServer {
        base_url: format!("http://{addr}/playernew/player.php"),
        requests: req_rx,
        served: served_rx,
    }
}
