//! Scripted [`PropertySource`] for loader tests.
//!
//! Each `fetch_page` pops the next scripted result; once the script is
//! exhausted it answers with an empty page.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{GeoBounds, Property};
use crate::error::FetchError;
use crate::port::{PropertySource, ViewportPage, ViewportQuery};

type PageResult = Result<ViewportPage, FetchError>;

pub struct ScriptedPropertySource {
    results: Mutex<VecDeque<PageResult>>,
    queries: Mutex<Vec<ViewportQuery>>,
    delay: Duration,
    calls: Arc<AtomicU32>,
}

impl ScriptedPropertySource {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Queue the result of the next unanswered call.
    pub fn respond(self, result: Result<Vec<Property>, FetchError>) -> Self {
        self.respond_page(result.map(ViewportPage::from))
    }

    /// Queue a page whose raw row count may differ from its listings.
    pub fn respond_page(self, result: PageResult) -> Self {
        self.results.lock().unwrap().push_back(result);
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `fetch_page` calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Page numbers requested, in call order.
    pub fn pages_requested(&self) -> Vec<u32> {
        self.queries.lock().unwrap().iter().map(|q| q.page).collect()
    }

    /// Bounds requested, in call order.
    pub fn bounds_requested(&self) -> Vec<GeoBounds> {
        self.queries.lock().unwrap().iter().map(|q| q.bounds).collect()
    }
}

impl Default for ScriptedPropertySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PropertySource for ScriptedPropertySource {
    async fn fetch_page(&self, query: &ViewportQuery) -> PageResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(*query);
        let result = self.results.lock().unwrap().pop_front();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        result.unwrap_or_else(|| Ok(ViewportPage::default()))
    }
}
