// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request pacing and retry behaviour, on tokio's paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use swim_tracker::services::{FetchError, Fetcher, RequestGate, RetryPolicy, UserAgentPool};
use tokio::time::Instant;

mod common;
use common::{ok, open_gate, status, ScriptedTransport};

const URL: &str = "https://results.test/page.php";

/// Transport that stamps the paused clock on every call and answers with
/// `script[n]` for the nth call (the last entry repeats).
fn timed(script: Vec<u16>) -> (ScriptedTransport, Arc<Mutex<Vec<Instant>>>) {
    let stamps = Arc::new(Mutex::new(Vec::new()));
    let seen = stamps.clone();
    let count = AtomicUsize::new(0);
    let transport = ScriptedTransport::new(move |url, _| {
        seen.lock().unwrap().push(Instant::now());
        let n = count.fetch_add(1, Ordering::SeqCst);
        let code = script[n.min(script.len() - 1)];
        if code == 200 {
            Ok(ok(url, "<table><tr><td>ok</td></tr></table>"))
        } else {
            Ok(status(url, code))
        }
    });
    (transport, stamps)
}

fn gaps(stamps: &[Instant]) -> Vec<Duration> {
    stamps.windows(2).map(|w| w[1] - w[0]).collect()
}

#[tokio::test(start_paused = true)]
async fn test_requests_are_spaced_by_min_interval() {
    let (transport, stamps) = timed(vec![200]);
    let gate = Arc::new(RequestGate::new(
        Duration::from_secs(2),
        UserAgentPool::from_list(["TestAgent/1.0"]),
    ));
    let fetcher = Fetcher::new(transport, gate, RetryPolicy::default());

    for _ in 0..3 {
        fetcher.fetch(URL, &[]).await.unwrap();
    }

    let stamps = stamps.lock().unwrap();
    assert_eq!(stamps.len(), 3);
    for gap in gaps(&stamps) {
        assert!(gap >= Duration::from_secs(2), "gap {gap:?} under interval");
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_the_gate() {
    let (transport, stamps) = timed(vec![200]);
    let gate = Arc::new(RequestGate::new(
        Duration::from_secs(2),
        UserAgentPool::from_list(["TestAgent/1.0"]),
    ));
    let first = Fetcher::new(transport.clone(), gate.clone(), RetryPolicy::default());
    let second = Fetcher::new(transport, gate, RetryPolicy::default());

    let (a, b) = tokio::join!(first.fetch(URL, &[]), second.fetch(URL, &[]));
    assert!(a.is_ok() && b.is_ok());

    let stamps = stamps.lock().unwrap();
    assert!(gaps(&stamps)[0] >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_retry_backoff_is_4s_then_8s() {
    let (transport, stamps) = timed(vec![503, 429, 200]);
    let fetcher = Fetcher::new(transport.clone(), open_gate(), RetryPolicy::default());

    let body = fetcher.fetch(URL, &[]).await.unwrap();

    assert!(body.contains("ok"));
    assert_eq!(transport.calls(), 3);
    let gaps = gaps(&stamps.lock().unwrap());
    assert_eq!(gaps, vec![Duration::from_secs(4), Duration::from_secs(8)]);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_three_attempts() {
    let transport = ScriptedTransport::unreachable();
    let fetcher = Fetcher::new(transport.clone(), open_gate(), RetryPolicy::default());

    let err = fetcher.fetch(URL, &[]).await.unwrap_err();

    assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_client_errors_are_not_retried() {
    for code in [400, 403, 404] {
        let transport = ScriptedTransport::always_status(code);
        let fetcher = Fetcher::new(transport.clone(), open_gate(), RetryPolicy::default());

        let err = fetcher.fetch(URL, &[]).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status, .. } if status == code));
        assert_eq!(transport.calls(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_challenge_page_is_retried() {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let transport = ScriptedTransport::new(move |url, _| {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(ok(url, "<html><head><title>Just a moment...</title></head></html>"))
        } else {
            Ok(ok(url, "<table><tr><td>50 Free</td></tr></table>"))
        }
    });
    let fetcher = Fetcher::new(transport, open_gate(), RetryPolicy::default());

    let body = fetcher.fetch(URL, &[]).await.unwrap();

    assert!(body.contains("50 Free"));
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_blocked_redirect_is_retried() {
    let transport = ScriptedTransport::new(|_, _| {
        Ok(swim_tracker::services::RawResponse {
            status: 200,
            final_url: "https://results.test/blocked.html".to_string(),
            body: Vec::new(),
        })
    });
    let fetcher = Fetcher::new(transport.clone(), open_gate(), RetryPolicy::default());

    assert!(fetcher.fetch(URL, &[]).await.is_err());
    assert_eq!(transport.calls(), 3);
}
