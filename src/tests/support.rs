/// Shared fixtures: an in-memory backend that records every call, and a view
/// that records every render.
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use tokio::time::Instant;

use crate::api::{ApiError, SwapBackend};
use crate::controller::{ControllerHandle, ControllerSettings, ControllerSnapshot, QuoteController};
use crate::selection::{InputChange, Selection};
use crate::types::{ChainCatalog, ChainDescriptor, ExecutionResult, Leg, Quote, QuoteRequest, Route};
use crate::view::{ChainOption, Notice, QuoteDisplay, QuoteView};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn chain(name: &str, native: &str, online: bool, tokens: &[&str]) -> ChainDescriptor {
    ChainDescriptor {
        id: String::new(),
        name: name.to_string(),
        native_token_symbol: native.to_string(),
        rpc_connected: online,
        tokens: tokens.iter().map(|t| t.to_string()).collect(),
    }
}

/// flare, ethereum and polygon online; metis offline.
pub fn sample_catalog() -> ChainCatalog {
    let mut chains = BTreeMap::new();
    chains.insert("flare".to_string(), chain("Flare", "FLR", true, &["FLR", "WFLR", "USDT"]));
    chains.insert("ethereum".to_string(), chain("Ethereum", "ETH", true, &["ETH", "USDT", "USDC"]));
    chains.insert("polygon".to_string(), chain("Polygon", "MATIC", true, &["MATIC", "USDT", "USDC"]));
    chains.insert("metis".to_string(), chain("Metis", "METIS", false, &["METIS"]));
    ChainCatalog::new(chains)
}

/// What the mock backend quotes for a request: 1.5% haircut, fixed fees.
pub fn quote_for(request: &QuoteRequest) -> Quote {
    Quote {
        from_chain: request.from_chain.clone(),
        to_chain: request.to_chain.clone(),
        from_token: request.from_token.clone(),
        to_token: request.to_token.clone(),
        amount_in: request.amount,
        amount_out: request.amount * dec!(0.985),
        bridge_fee_usd: dec!(1.25),
        gas_estimate_usd: dec!(0.4),
        total_fee_usd: dec!(1.65),
        price_impact_pct: dec!(0.3),
        route: Route { name: "LayerZero".to_string() },
        estimated_time: "5-10 minutes".to_string(),
    }
}

// ── Mock backend ──────────────────────────────────────────────────────────────

pub enum Reply<T> {
    Ok(T),
    Reject(String),
    HttpError(u16),
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, ApiError> {
        match self {
            Reply::Ok(v) => Ok(v),
            Reply::Reject(msg) => Err(ApiError::Rejected(msg)),
            Reply::HttpError(status) => Err(ApiError::Status { status, body: "upstream down".into() }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuoteCall {
    pub at: Instant,
    pub request: QuoteRequest,
}

/// Scripted replies are consumed first; once a queue is empty the backend
/// quotes with [`quote_for`] and executes successfully.
#[derive(Default)]
pub struct MockBackend {
    chains_fail: bool,
    quote_replies: Mutex<VecDeque<Reply<Quote>>>,
    quote_delays: Mutex<VecDeque<Duration>>,
    execute_replies: Mutex<VecDeque<Reply<ExecutionResult>>>,
    execute_delays: Mutex<VecDeque<Duration>>,
    quote_calls: Mutex<Vec<QuoteCall>>,
    execute_calls: Mutex<Vec<QuoteRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_chains() -> Self {
        Self { chains_fail: true, ..Self::default() }
    }

    pub fn push_quote(&self, reply: Reply<Quote>) {
        self.quote_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_quote_delay(&self, delay: Duration) {
        self.quote_delays.lock().unwrap().push_back(delay);
    }

    pub fn push_execute(&self, reply: Reply<ExecutionResult>) {
        self.execute_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_execute_delay(&self, delay: Duration) {
        self.execute_delays.lock().unwrap().push_back(delay);
    }

    pub fn quote_calls(&self) -> Vec<QuoteCall> {
        self.quote_calls.lock().unwrap().clone()
    }

    pub fn execute_calls(&self) -> Vec<QuoteRequest> {
        self.execute_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapBackend for MockBackend {
    async fn supported_chains(&self) -> Result<ChainCatalog, ApiError> {
        if self.chains_fail {
            return Err(ApiError::Status { status: 503, body: "maintenance".into() });
        }
        Ok(sample_catalog())
    }

    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError> {
        self.quote_calls.lock().unwrap().push(QuoteCall {
            at: Instant::now(),
            request: request.clone(),
        });
        let delay = self.quote_delays.lock().unwrap().pop_front();
        let reply = self.quote_replies.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Some(reply) => reply.into_result(),
            None => Ok(quote_for(request)),
        }
    }

    async fn execute(&self, request: &QuoteRequest) -> Result<ExecutionResult, ApiError> {
        self.execute_calls.lock().unwrap().push(request.clone());
        let delay = self.execute_delays.lock().unwrap().pop_front();
        let reply = self.execute_replies.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Some(reply) => reply.into_result(),
            None => Ok(ExecutionResult {
                success: true,
                message: format!("Swapped {} {}", request.amount, request.from_token),
            }),
        }
    }
}

// ── Recording view ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Chains(Vec<ChainOption>),
    Tokens(Leg, Vec<String>),
    Cleared,
    Loading,
    Quote(QuoteDisplay),
    QuoteError(String),
    SubmitEnabled(bool),
    Notice(Notice),
    FormReset(Selection),
}

#[derive(Clone, Default)]
pub struct RecordingView {
    log: Arc<Mutex<Vec<Rendered>>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<Rendered> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Rendered> {
        self.log.lock().unwrap().last().cloned()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|r| match r {
                Rendered::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn quotes(&self) -> Vec<QuoteDisplay> {
        self.events()
            .into_iter()
            .filter_map(|r| match r {
                Rendered::Quote(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    fn push(&self, r: Rendered) {
        self.log.lock().unwrap().push(r);
    }
}

impl QuoteView for RecordingView {
    fn show_chains(&mut self, options: &[ChainOption]) {
        self.push(Rendered::Chains(options.to_vec()));
    }

    fn show_tokens(&mut self, leg: Leg, tokens: &[String]) {
        self.push(Rendered::Tokens(leg, tokens.to_vec()));
    }

    fn clear_quote(&mut self) {
        self.push(Rendered::Cleared);
    }

    fn show_loading(&mut self) {
        self.push(Rendered::Loading);
    }

    fn show_quote(&mut self, quote: &QuoteDisplay) {
        self.push(Rendered::Quote(quote.clone()));
    }

    fn show_quote_error(&mut self, message: &str) {
        self.push(Rendered::QuoteError(message.to_string()));
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.push(Rendered::SubmitEnabled(enabled));
    }

    fn notify(&mut self, notice: Notice) {
        self.push(Rendered::Notice(notice));
    }

    fn reset_form(&mut self, selection: &Selection) {
        self.push(Rendered::FormReset(selection.clone()));
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

pub const DEBOUNCE: Duration = Duration::from_millis(500);

pub struct Harness {
    pub handle: ControllerHandle,
    pub backend: Arc<MockBackend>,
    pub view: RecordingView,
}

/// Let every ready task run. With a paused clock the runtime only advances
/// time once nothing else can make progress, so this drains the controller.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub async fn start_with(backend: MockBackend, settings: ControllerSettings) -> Harness {
    let backend = Arc::new(backend);
    let view = RecordingView::default();
    let controller = QuoteController::new(backend.clone(), view.clone(), settings);
    let (handle, _task) = controller.spawn();
    handle.send(crate::controller::Command::LoadChains);
    settle().await;
    Harness { handle, backend, view }
}

pub async fn start() -> Harness {
    start_with(MockBackend::new(), ControllerSettings::default()).await
}

impl Harness {
    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.handle.snapshot().await.expect("controller running")
    }

    pub fn input(&self, change: InputChange) {
        assert!(self.handle.input(change), "controller running");
    }

    /// flare/FLR → `to_chain`/`to_token`, amount as given. Does not wait.
    pub fn fill(&self, to_chain: &str, to_token: &str, amount: &str) {
        self.input(InputChange::Chain(Leg::From, "flare".into()));
        self.input(InputChange::Token(Leg::From, "FLR".into()));
        self.input(InputChange::Chain(Leg::To, to_chain.into()));
        self.input(InputChange::Token(Leg::To, to_token.into()));
        self.input(InputChange::Amount(amount.into()));
    }

    /// Fill the form and wait out the debounce so a quote is displayed.
    pub async fn quoted(&self, to_chain: &str, to_token: &str, amount: &str) -> Quote {
        self.fill(to_chain, to_token, amount);
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(10)).await;
        self.snapshot()
            .await
            .current_quote
            .expect("quote should be displayed after the debounce window")
    }
}
