//! Spacing guarantees of the outbound request limiter.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use spots::{CatalogSource, RateLimiter, ScryfallClient, SpotsError};

/// Slack for the limiter's clock and `Instant` disagreeing slightly.
const CLOCK_SLACK: Duration = Duration::from_millis(1);

#[test]
fn sequential_acquisitions_are_spaced() {
    let interval = Duration::from_millis(20);
    let limiter = RateLimiter::new(interval);

    let start = Instant::now();
    for _ in 0..5 {
        limiter.acquire();
    }
    assert!(start.elapsed() + CLOCK_SLACK >= interval * 4);
}

#[test]
fn concurrent_callers_are_serialized() {
    let interval = Duration::from_millis(30);
    let limiter = Arc::new(RateLimiter::new(interval));

    let start = Instant::now();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let limiter = limiter.clone();
            thread::spawn(move || {
                limiter.acquire();
                Instant::now()
            })
        })
        .collect();
    let mut finished: Vec<Instant> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    finished.sort();

    // The last caller was released three intervals after the first.
    assert!(finished[3] - start + CLOCK_SLACK >= interval * 3);
}

#[test]
fn default_interval_is_short() {
    let limiter = RateLimiter::default();
    assert_eq!(limiter.min_interval(), Duration::from_millis(75));
}

/// Answer every request with an empty 404 until the listener is dropped.
fn serve_not_found(listener: TcpListener) {
    for stream in listener.incoming() {
        let Ok(mut stream) = stream else { break };
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
    }
}

#[test]
fn client_calls_share_the_limiter() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    thread::spawn(move || serve_not_found(listener));

    let interval = Duration::from_millis(40);
    let client = ScryfallClient::new()
        .base_url(base)
        .timeout(Duration::from_secs(5))
        .rate_limiter(Arc::new(RateLimiter::new(interval)));

    let start = Instant::now();
    for code in ["aaa", "bbb", "ccc", "ddd", "eee"] {
        let err = client.get_set(code).unwrap_err();
        assert!(matches!(err, SpotsError::NotFound(_)));
    }
    assert!(start.elapsed() + CLOCK_SLACK >= interval * 4);
}
