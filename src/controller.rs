use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::api::{ApiError, SwapBackend};
use crate::debounce::{Debouncer, Ticket};
use crate::selection::{InputChange, Selection};
use crate::types::{ChainCatalog, ExecutionResult, Leg, Quote};
use crate::view::{self, Notice, QuoteDisplay, QuoteView};

const QUOTE_FAILED: &str = "Failed to get quote";
const SWAP_FAILED: &str = "Cross-chain swap failed";
const NO_QUOTE: &str = "No quote available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotePhase {
    Idle,
    Loading,
    Displayed,
    Errored,
    Executing,
}

/// What to do with a quote response that is not from the latest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Apply responses as they arrive; a slow stale one may overwrite a
    /// fresher quote.
    Arrival,
    /// Drop any response whose request has since been superseded.
    Latest,
}

impl std::str::FromStr for ResponseOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arrival" => Ok(Self::Arrival),
            "latest" => Ok(Self::Latest),
            other => Err(format!("unknown quote ordering `{other}` (expected arrival|latest)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub debounce: Duration,
    pub default_from_chain: String,
    pub ordering: ResponseOrdering,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            default_from_chain: "flare".to_string(),
            ordering: ResponseOrdering::Arrival,
        }
    }
}

/// User-originated actions.
#[derive(Debug)]
pub enum Command {
    LoadChains,
    ShowChains,
    Input(InputChange),
    QuickChain(String),
    RequestQuote,
    Execute,
    Submit,
    Snapshot(oneshot::Sender<ControllerSnapshot>),
    Shutdown,
}

/// Everything the controller task reacts to. Timer and network completions
/// come back through the same queue as commands, so state is only ever
/// touched by one handler at a time.
enum Event {
    Command(Command),
    DebounceElapsed(Ticket),
    ChainsLoaded(Result<ChainCatalog, ApiError>),
    QuoteSettled { seq: u64, outcome: Result<Quote, ApiError> },
    ExecutionSettled(Result<ExecutionResult, ApiError>),
}

#[derive(Debug, Clone, Serialize)]
pub struct ControllerSnapshot {
    pub phase: QuotePhase,
    pub selection: Selection,
    pub current_quote: Option<Quote>,
    pub chains_loaded: usize,
    pub quote_pending: bool,
    pub executing: bool,
}

/// Cloneable front door to a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl ControllerHandle {
    /// Returns false once the controller has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(Event::Command(command)).is_ok()
    }

    pub fn input(&self, change: InputChange) -> bool {
        self.send(Command::Input(change))
    }

    pub fn quick_chain(&self, chain: impl Into<String>) -> bool {
        self.send(Command::QuickChain(chain.into()))
    }

    pub fn execute(&self) -> bool {
        self.send(Command::Execute)
    }

    pub async fn snapshot(&self) -> Option<ControllerSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if !self.send(Command::Snapshot(reply_tx)) {
            return None;
        }
        reply_rx.await.ok()
    }
}

/// Owns the swap form, the single current quote and the quote lifecycle.
pub struct QuoteController<B: SwapBackend, V: QuoteView> {
    backend: Arc<B>,
    view: V,
    settings: ControllerSettings,
    catalog: ChainCatalog,
    selection: Selection,
    current_quote: Option<Quote>,
    phase: QuotePhase,
    /// Set while a swap request is in flight. Only its settlement clears it,
    /// whatever happens to the form or the quote meanwhile.
    executing: bool,
    debouncer: Debouncer,
    /// Sequence number of the most recently issued quote request.
    latest_seq: u64,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl<B: SwapBackend, V: QuoteView> QuoteController<B, V> {
    pub fn new(backend: Arc<B>, view: V, settings: ControllerSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::new(settings.debounce);
        Self {
            backend,
            view,
            settings,
            catalog: ChainCatalog::default(),
            selection: Selection::default(),
            current_quote: None,
            phase: QuotePhase::Idle,
            executing: false,
            debouncer,
            latest_seq: 0,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle { tx: self.tx.clone() }
    }

    /// Spawn the event loop and return its handle.
    pub fn spawn(self) -> (ControllerHandle, tokio::task::JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run());
        (handle, task)
    }

    pub async fn run(mut self) {
        tracing::info!(
            debounce_ms = self.settings.debounce.as_millis() as u64,
            ordering = ?self.settings.ordering,
            "quote controller started"
        );

        while let Some(event) = self.rx.recv().await {
            match event {
                Event::Command(Command::Shutdown) => break,
                Event::Command(command) => self.on_command(command),
                Event::DebounceElapsed(ticket) => {
                    if self.debouncer.settle(ticket) {
                        self.request_quote();
                    } else {
                        tracing::trace!(ticket, "stale debounce ticket ignored");
                    }
                }
                Event::ChainsLoaded(outcome) => self.on_chains_loaded(outcome),
                Event::QuoteSettled { seq, outcome } => self.on_quote_settled(seq, outcome),
                Event::ExecutionSettled(outcome) => self.on_execution_settled(outcome),
            }
        }

        tracing::info!("quote controller stopped");
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::LoadChains => self.load_chains(),
            Command::ShowChains => self.view.show_chains(&view::chain_options(&self.catalog)),
            Command::Input(change) => self.input_changed(change),
            Command::QuickChain(chain) => self.select_quick_chain(chain),
            Command::RequestQuote => self.request_quote(),
            Command::Execute => self.execute_swap(),
            Command::Submit => self.submit(),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            phase: self.phase,
            selection: self.selection.clone(),
            current_quote: self.current_quote.clone(),
            chains_loaded: self.catalog.len(),
            quote_pending: self.debouncer.is_pending(),
            executing: self.executing,
        }
    }

    // ── Chains ──────────────────────────────────────────────────────────────

    pub fn load_chains(&mut self) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = backend.supported_chains().await;
            let _ = tx.send(Event::ChainsLoaded(outcome));
        });
    }

    fn on_chains_loaded(&mut self, outcome: Result<ChainCatalog, ApiError>) {
        match outcome {
            Ok(catalog) if catalog.is_empty() => {
                tracing::warn!("backend reported no supported chains");
                self.catalog = catalog;
            }
            Ok(catalog) => {
                tracing::info!(chains = catalog.len(), "supported chains loaded");
                self.catalog = catalog;
            }
            Err(e) => {
                tracing::error!(error = %e, "could not load supported chains");
                self.catalog = ChainCatalog::default();
            }
        }

        self.view.show_chains(&view::chain_options(&self.catalog));

        let default_chain = self.settings.default_from_chain.clone();
        if self.catalog.is_selectable(&default_chain) {
            self.selection.from_chain = default_chain;
        }
        self.refresh_tokens(Leg::From);
        self.refresh_tokens(Leg::To);
    }

    fn refresh_tokens(&mut self, leg: Leg) {
        let chain = self.selection.chain(leg).to_string();
        let tokens = self.catalog.tokens(&chain).to_vec();
        let token = self.selection.token(leg);
        if !token.is_empty() && !tokens.iter().any(|t| t == token) {
            self.selection.set_token(leg, String::new());
        }
        self.view.show_tokens(leg, &tokens);
    }

    /// Rejects chains and tokens the form would not have offered.
    fn check_change(&self, change: &InputChange) -> Result<(), String> {
        match change {
            InputChange::Chain(_, chain) if chain.is_empty() => Ok(()),
            InputChange::Chain(_, chain) => match self.catalog.get(chain) {
                None => Err(format!("Unknown chain: {chain}")),
                Some(c) if !c.rpc_connected => Err(format!("{} is offline", c.name)),
                Some(_) => Ok(()),
            },
            InputChange::Token(_, token) if token.is_empty() => Ok(()),
            InputChange::Token(leg, token) => {
                let chain = self.selection.chain(*leg);
                match self.catalog.get(chain) {
                    None => Err(format!("Select a {leg} chain first")),
                    Some(c) if !c.offers(token) => {
                        Err(format!("{token} is not available on {}", c.name))
                    }
                    Some(_) => Ok(()),
                }
            }
            InputChange::Amount(_) => Ok(()),
        }
    }

    // ── Quote lifecycle ─────────────────────────────────────────────────────

    /// The phase shown while a swap is in flight is always `Executing`.
    fn set_phase(&mut self, phase: QuotePhase) {
        self.phase = if self.executing { QuotePhase::Executing } else { phase };
    }

    /// Drop the current quote and return to `Idle`. Under `Latest` ordering
    /// this also orphans every in-flight quote response.
    fn invalidate_quote(&mut self) {
        self.current_quote = None;
        self.set_phase(QuotePhase::Idle);
        if self.settings.ordering == ResponseOrdering::Latest {
            self.latest_seq += 1;
        }
        self.view.clear_quote();
    }

    fn apply_change(&mut self, change: InputChange) -> bool {
        if let Err(msg) = self.check_change(&change) {
            tracing::warn!(change = %change, reason = msg, "input rejected");
            self.view.notify(Notice::warning(msg));
            return false;
        }

        tracing::debug!(change = %change, "input changed");
        let chain_leg = match &change {
            InputChange::Chain(leg, _) => Some(*leg),
            _ => None,
        };
        self.selection.apply(change);
        if let Some(leg) = chain_leg {
            self.refresh_tokens(leg);
        }
        self.invalidate_quote();
        true
    }

    pub fn input_changed(&mut self, change: InputChange) {
        if !self.apply_change(change) {
            return;
        }
        let tx = self.tx.clone();
        self.debouncer.schedule(move |ticket| {
            let _ = tx.send(Event::DebounceElapsed(ticket));
        });
    }

    pub fn select_quick_chain(&mut self, chain: String) {
        if !self.apply_change(InputChange::Chain(Leg::To, chain)) {
            return;
        }
        self.debouncer.cancel();
        self.request_quote();
    }

    pub fn request_quote(&mut self) {
        let Some(request) = self.selection.to_request() else {
            tracing::debug!("selection incomplete — no quote requested");
            self.current_quote = None;
            self.set_phase(QuotePhase::Idle);
            self.view.clear_quote();
            return;
        };

        self.latest_seq += 1;
        let seq = self.latest_seq;
        self.set_phase(QuotePhase::Loading);
        self.view.show_loading();
        tracing::info!(seq, request = %request, "requesting quote");

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = backend.quote(&request).await;
            let _ = tx.send(Event::QuoteSettled { seq, outcome });
        });
    }

    fn on_quote_settled(&mut self, seq: u64, outcome: Result<Quote, ApiError>) {
        if self.settings.ordering == ResponseOrdering::Latest && seq != self.latest_seq {
            tracing::debug!(seq, latest = self.latest_seq, "superseded quote response dropped");
            return;
        }

        match outcome {
            Ok(quote) => {
                tracing::info!(
                    seq,
                    amount_in = %quote.amount_in,
                    amount_out = %quote.amount_out,
                    route = quote.route.name,
                    "quote received"
                );
                self.view.show_quote(&QuoteDisplay::from_quote(&quote));
                self.current_quote = Some(quote);
                self.set_phase(QuotePhase::Displayed);
            }
            Err(e) => {
                match &e {
                    ApiError::Rejected(msg) => tracing::warn!(seq, reason = msg, "quote rejected"),
                    other => tracing::error!(seq, error = %other, "quote request failed"),
                }
                self.current_quote = None;
                self.set_phase(QuotePhase::Errored);
                self.view.show_quote_error(&e.user_message(QUOTE_FAILED));
            }
        }
    }

    // ── Execution ───────────────────────────────────────────────────────────

    pub fn execute_swap(&mut self) {
        if self.executing {
            tracing::warn!("execute ignored: a swap is already in flight");
            return;
        }
        let Some(quote) = self.current_quote.as_ref() else {
            tracing::warn!("execute requested without a quote");
            self.view.notify(Notice::error(NO_QUOTE));
            return;
        };

        let request = quote.execution_request();
        tracing::info!(request = %request, route = quote.route.name, "executing cross-chain swap");
        self.executing = true;
        self.phase = QuotePhase::Executing;
        self.view.set_submit_enabled(false);

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = backend.execute(&request).await;
            let _ = tx.send(Event::ExecutionSettled(outcome));
        });
    }

    fn on_execution_settled(&mut self, outcome: Result<ExecutionResult, ApiError>) {
        self.executing = false;
        self.view.set_submit_enabled(true);

        match outcome {
            Ok(result) if result.success => {
                tracing::info!(message = result.message, "cross-chain swap executed");
                self.view.notify(Notice::success(result.message));
                self.invalidate_quote();
                self.reset_form();
            }
            Ok(result) => {
                tracing::warn!(message = result.message, "cross-chain swap rejected");
                let message = if result.message.is_empty() {
                    SWAP_FAILED.to_string()
                } else {
                    result.message
                };
                self.view.notify(Notice::error(message));
                self.restore_after_failed_execution();
            }
            Err(e) => {
                tracing::error!(error = %e, "cross-chain swap request failed");
                self.view.notify(Notice::error(e.user_message(SWAP_FAILED)));
                self.restore_after_failed_execution();
            }
        }
    }

    /// The held quote may be the executed one, a newer one quoted meanwhile,
    /// or none if the form was edited.
    fn restore_after_failed_execution(&mut self) {
        self.phase = if self.current_quote.is_some() {
            QuotePhase::Displayed
        } else {
            QuotePhase::Idle
        };
    }

    fn reset_form(&mut self) {
        self.debouncer.cancel();
        self.selection = Selection::default();
        let default_chain = self.settings.default_from_chain.clone();
        if self.catalog.is_selectable(&default_chain) {
            self.selection.from_chain = default_chain;
        }
        self.refresh_tokens(Leg::From);
        self.refresh_tokens(Leg::To);
        self.view.reset_form(&self.selection);
    }

    /// Form submit: execute the held quote, or fetch one right away.
    pub fn submit(&mut self) {
        if self.executing {
            tracing::warn!("submit ignored: a swap is already in flight");
            return;
        }
        if self.current_quote.is_some() {
            self.execute_swap();
        } else {
            self.debouncer.cancel();
            self.request_quote();
        }
    }
}
