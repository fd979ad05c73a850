//! Reaching a launched artifact: its address, waiting for its server to come
//! up, and opening it in a browser.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

/// Local address of an artifact published on `host_port`.
pub fn address(host_port: u16) -> String {
    format!("http://localhost:{}", host_port)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The server answered (any status) after this long.
    Ready(Duration),
    TimedOut,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }
}

/// Poll `url` with GET until anything answers or `timeout` elapses.
///
/// Any HTTP response counts: a 404 still means the server is listening.
/// Only connection-level failures keep the poll going.
pub async fn wait_until_ready(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    interval: Duration,
) -> Readiness {
    let started = Instant::now();
    let deadline = started + timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());
        let request = client.get(url).timeout(remaining.max(Duration::from_millis(1)));
        match request.send().await {
            Ok(response) => {
                let elapsed = started.elapsed();
                info!(url = %url, status = %response.status(), attempts, elapsed_ms = elapsed.as_millis() as u64, "artifact is serving");
                return Readiness::Ready(elapsed);
            }
            Err(e) => debug!(url = %url, attempt = attempts, error = %e, "artifact not ready"),
        }

        let now = Instant::now();
        if now >= deadline {
            return Readiness::TimedOut;
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

/// Open `url` with the platform's default browser.
pub fn open_in_browser(url: &str) -> std::io::Result<()> {
    open::that(url)
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::routing::get;
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn test_address_format() {
        assert_eq!(address(8500), "http://localhost:8500");
    }

    #[tokio::test]
    async fn test_ready_when_server_answers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/", get(|| async { "hello" }));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let readiness = wait_until_ready(
            &reqwest::Client::new(),
            &format!("http://{}", addr),
            Duration::from_secs(5),
            Duration::from_millis(50),
        )
        .await;
        assert!(readiness.is_ready());
    }

    #[tokio::test]
    async fn test_error_status_still_counts_as_ready() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // No routes: every request is a 404.
        let app = Router::new();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let readiness = wait_until_ready(
            &reqwest::Client::new(),
            &format!("http://{}/missing", addr),
            Duration::from_secs(5),
            Duration::from_millis(50),
        )
        .await;
        assert!(readiness.is_ready());
    }

    #[tokio::test]
    async fn test_times_out_when_nothing_listens() {
        // Bind then drop to get a port that is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let started = std::time::Instant::now();
        let readiness = wait_until_ready(
            &reqwest::Client::new(),
            &format!("http://127.0.0.1:{}", port),
            Duration::from_millis(300),
            Duration::from_millis(50),
        )
        .await;
        assert_eq!(readiness, Readiness::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
