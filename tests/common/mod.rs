// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swim_tracker::config::Config;
use swim_tracker::db::{FirestoreDb, MemoryStore};
use swim_tracker::routes::create_router;
use swim_tracker::services::{
    Fetcher, HttpTransport, ManualClock, RawResponse, RequestGate, RetryPolicy, SwimmerService,
    TransportError, UserAgentPool,
};
use swim_tracker::AppState;

#[allow(dead_code)]
pub const TIREF: &str = "1507205";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Fixed starting point for the manual clock.
#[allow(dead_code)]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// SCRIPTED TRANSPORT
// ═══════════════════════════════════════════════════════════════════════════

type Responder = dyn Fn(&str, &[(&'static str, String)]) -> Result<RawResponse, TransportError>
    + Send
    + Sync;

/// Transport that answers from a closure and records every call.
/// Clones share the call log.
#[derive(Clone)]
pub struct ScriptedTransport {
    responder: Arc<Responder>,
    calls: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(&str, &[(&'static str, String)]) -> Result<RawResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(AtomicUsize::new(0)),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serves the swimmer fixture pages below.
    pub fn results_site() -> Self {
        Self::new(|url, query| {
            if url.ends_with("/personal_best.php") {
                return Ok(ok(url, SUMMARY_HTML));
            }
            if url.ends_with("/personal_best_time_date.php") {
                return Ok(match (param(query, "tstroke"), param(query, "tcourse")) {
                    ("1", "L") => ok(url, FREESTYLE_50_LC_HTML),
                    ("14", "S") => ok(url, BACKSTROKE_100_SC_HTML),
                    _ => status(url, 404),
                });
            }
            Ok(status(url, 404))
        })
    }

    /// Every request fails at the network level.
    pub fn unreachable() -> Self {
        Self::new(|_, _| Err(TransportError("connection refused".to_string())))
    }

    /// Every request gets the same status and empty body.
    pub fn always_status(code: u16) -> Self {
        Self::new(move |url, _| Ok(status(url, code)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        _user_agent: &str,
    ) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(url.to_string());
        (self.responder)(url, query)
    }
}

fn param<'a>(query: &'a [(&'static str, String)], name: &str) -> &'a str {
    query
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

#[allow(dead_code)]
pub fn ok(url: &str, body: &str) -> RawResponse {
    RawResponse {
        status: 200,
        final_url: url.to_string(),
        body: body.as_bytes().to_vec(),
    }
}

#[allow(dead_code)]
pub fn status(url: &str, code: u16) -> RawResponse {
    RawResponse {
        status: code,
        final_url: url.to_string(),
        body: Vec::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURE PAGES
// ═══════════════════════════════════════════════════════════════════════════

/// Best times: one long course event and one short course event.
pub const SUMMARY_HTML: &str = r#"<html>
<head><title>Individual Best Times</title></head>
<body>
<p class="rnk_sj">Khushi Rohit - (<a href="/biogs/biogs_details.php?tiref=1507205">1507205</a>) - Sutton &amp; Cheam SC</p>
<table>
  <tr><th>Stroke LC</th><th>Time</th><th>Converted</th><th>WA Pts</th><th>Date</th><th>Meet</th><th>Venue</th><th>Licence</th></tr>
  <tr><td>50 Freestyle</td><td>30.10</td><td>30.10</td><td>400</td><td>05/10/24</td><td>County Champs</td><td>Leeds</td><td>L1</td></tr>
</table>
<table>
  <tr><th>Stroke SC</th><th>Time</th><th>Converted</th><th>WA Pts</th><th>Date</th><th>Meet</th><th>Venue</th><th>Licence</th></tr>
  <tr><td>100 Backstroke</td><td>1:10.00</td><td>1:11.50</td><td>350</td><td>12/01/25</td><td>Winter Gala</td><td>Bath</td><td>L2</td></tr>
</table>
</body>
</html>"#;

/// 50 Freestyle LC history. The first row is the summary's best.
pub const FREESTYLE_50_LC_HTML: &str = r#"<html><body>
<table>
  <tr><th>Time</th><th>WA Pts</th><th>Round</th><th>Date</th><th>Meet</th><th>Venue</th></tr>
  <tr><td>30.10</td><td>400</td><td>F</td><td>05/10/24</td><td>County Champs</td><td>Leeds</td></tr>
  <tr><td>30.80</td><td>380</td><td>H</td><td>05/10/24</td><td>County Champs</td><td>Leeds</td></tr>
  <tr><td>31.50</td><td>360</td><td>F</td><td>14/06/24</td><td>Summer Open</td><td>Sheffield</td></tr>
</table>
</body></html>"#;

/// 100 Backstroke SC history. The heat swim repeats the final's time at the
/// same meet, so it merges with it.
pub const BACKSTROKE_100_SC_HTML: &str = r#"<html><body>
<table>
  <tr><th>Time</th><th>WA Pts</th><th>Round</th><th>Date</th><th>Meet</th><th>Venue</th></tr>
  <tr><td>1:10.00</td><td>350</td><td>F</td><td>12/01/25</td><td>Winter Gala</td><td>Bath</td></tr>
  <tr><td>1:10.00</td><td>350</td><td>H</td><td>12/01/25</td><td>Winter Gala</td><td>Bath</td></tr>
  <tr><td>1:12.40</td><td>320</td><td>F</td><td>03/11/24</td><td>Autumn Meet</td><td>Bath</td></tr>
</table>
</body></html>"#;

// ═══════════════════════════════════════════════════════════════════════════
// APP BUILDERS
// ═══════════════════════════════════════════════════════════════════════════

#[allow(dead_code)]
pub type TestService = SwimmerService<MemoryStore, ScriptedTransport>;

/// Service over an in-memory store with the production gate and retry
/// policy. Pair with `start_paused` tests so waits cost nothing.
#[allow(dead_code)]
pub fn test_service(
    store: MemoryStore,
    transport: ScriptedTransport,
    clock: Arc<ManualClock>,
) -> TestService {
    let config = Config::test_default();
    let gate = Arc::new(RequestGate::new(
        config.min_request_interval,
        UserAgentPool::from_list(["TestAgent/1.0"]),
    ));
    SwimmerService::new(
        store,
        Fetcher::new(transport, gate, RetryPolicy::default()),
        clock,
        config.results_base_url,
        config.cache_ttl,
    )
}

/// Everything a router test needs to drive and inspect the app.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState<MemoryStore, ScriptedTransport>>,
    pub store: MemoryStore,
    pub transport: ScriptedTransport,
    pub clock: Arc<ManualClock>,
}

/// Create a test app over the given transport.
#[allow(dead_code)]
pub fn create_test_app(transport: ScriptedTransport) -> TestApp {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(epoch()));
    let service = test_service(store.clone(), transport.clone(), clock.clone());

    let state = Arc::new(AppState {
        config: Config::test_default(),
        service,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        transport,
        clock,
    }
}

/// Gate with no interval, for tests that only care about retries.
#[allow(dead_code)]
pub fn open_gate() -> Arc<RequestGate> {
    Arc::new(RequestGate::new(
        Duration::ZERO,
        UserAgentPool::from_list(["TestAgent/1.0"]),
    ))
}
