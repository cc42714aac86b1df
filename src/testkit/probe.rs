//! Scripted [`VideoProbe`] for resolver tests.
//!
//! Each probe pops the next scripted result. The last scripted result
//! repeats once the script runs out; an empty script answers 200.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::ProbeError;
use crate::port::{ProbeResponse, VideoProbe};

type ProbeResult = Result<ProbeResponse, ProbeError>;

pub struct ScriptedProbe {
    results: Mutex<VecDeque<ProbeResult>>,
    urls: Mutex<Vec<Url>>,
    delay: Duration,
    calls: Arc<AtomicU32>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            urls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Queue an HTTP answer.
    pub fn respond(self, response: ProbeResponse) -> Self {
        self.results.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a transport failure.
    pub fn fail(self, error: ProbeError) -> Self {
        self.results.lock().unwrap().push_back(Err(error));
        self
    }

    /// Sleep this long before answering each probe.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of probes so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs probed, in call order.
    pub fn urls(&self) -> Vec<Url> {
        self.urls.lock().unwrap().clone()
    }

    fn next_result(&self) -> ProbeResult {
        let mut results = self.results.lock().unwrap();
        if results.len() > 1 {
            return results.pop_front().unwrap_or(Ok(ProbeResponse::status(200)));
        }
        results
            .front()
            .cloned()
            .unwrap_or(Ok(ProbeResponse::status(200)))
    }
}

impl Default for ScriptedProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoProbe for ScriptedProbe {
    async fn probe(&self, url: &Url) -> Result<ProbeResponse, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.clone());
        let result = self.next_result();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        result
    }
}
