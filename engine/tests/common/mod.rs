//! Shared stubs for conductor integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use sdk::ProviderReply;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use turnstile_engine::conductor::{
    Conductor, ConversationReply, ConversationResponder, FixedIntentClassifier, Intent,
};
use turnstile_engine::history::{HistoryStore, TurnRecord};
use turnstile_engine::llm;
use turnstile_engine::providers::{self, ProviderError, SearchProvider, SummaryProvider};

/// Search stub: counts calls, answers from a fixed text or fails
pub struct CountingSearch {
    pub calls: AtomicUsize,
    pub text: String,
    pub confidence: f64,
    pub fail: bool,
}

impl CountingSearch {
    pub fn answering(text: &str, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            text: text.to_string(),
            confidence,
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            text: String::new(),
            confidence: 0.0,
            fail: true,
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for CountingSearch {
    fn name(&self) -> &str {
        "counting-search"
    }

    async fn search(&self, query: &str) -> providers::Result<ProviderReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Network("connection refused".into()));
        }
        let text = if self.text.is_empty() {
            format!("results for {}", query)
        } else {
            self.text.clone()
        };
        Ok(ProviderReply {
            text,
            confidence: self.confidence,
            source: "stub".into(),
        })
    }
}

/// Summary stub: counts calls and records the documents it received
pub struct CountingSummary {
    pub calls: AtomicUsize,
    pub inputs: Mutex<Vec<Vec<String>>>,
    pub fail: bool,
}

impl CountingSummary {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Vec<String> {
        self.inputs.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl SummaryProvider for CountingSummary {
    fn name(&self) -> &str {
        "counting-summary"
    }

    async fn summarize(&self, documents: &[String]) -> providers::Result<ProviderReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(documents.to_vec());
        if self.fail {
            return Err(ProviderError::Rpc {
                code: -32000,
                message: "model unavailable".into(),
            });
        }
        Ok(ProviderReply {
            text: "A short summary.".into(),
            confidence: 0.75,
            source: "stub".into(),
        })
    }
}

/// Conversation stub: counts calls and reports the turns it saw
pub struct CountingResponder {
    pub calls: AtomicUsize,
    pub seen_turns: Mutex<Vec<u64>>,
}

impl CountingResponder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            seen_turns: Mutex::new(Vec::new()),
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationResponder for CountingResponder {
    async fn respond(&self, _query: &str, history: &[&TurnRecord]) -> llm::Result<ConversationReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen_turns.lock().unwrap() = history.iter().map(|r| r.turn).collect();
        Ok(ConversationReply {
            text: format!("We covered {} turns.", history.len()),
            confidence: 0.6,
        })
    }
}

/// Stubs wired into a conductor over a history file in `dir`
pub struct Harness {
    pub conductor: Conductor,
    pub search: Arc<CountingSearch>,
    pub summary: Arc<CountingSummary>,
    pub responder: Arc<CountingResponder>,
    pub store: HistoryStore,
}

pub fn harness(dir: &Path) -> Harness {
    harness_with(dir, CountingSearch::answering("", 0.8), CountingSummary::new())
}

pub fn harness_with(
    dir: &Path,
    search: Arc<CountingSearch>,
    summary: Arc<CountingSummary>,
) -> Harness {
    let store = HistoryStore::new(dir.join("state.csv"));
    let responder = CountingResponder::new();
    let conductor = Conductor::new(
        store.clone(),
        Arc::clone(&search) as Arc<dyn SearchProvider>,
        Arc::clone(&summary) as Arc<dyn SummaryProvider>,
        Arc::new(FixedIntentClassifier(Intent::Search)),
        Arc::clone(&responder) as Arc<dyn ConversationResponder>,
    );
    Harness {
        conductor,
        search,
        summary,
        responder,
        store,
    }
}
