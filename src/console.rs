use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::controller::{Command, ControllerHandle};
use crate::selection::{InputChange, Selection};
use crate::types::Leg;
use crate::view::{ChainOption, Notice, PriceImpactLevel, QuoteDisplay, QuoteView};

const HELP: &str = "\
commands:
  from <chain>      source chain            to <chain>       destination chain
  send <token>      token to send           receive <token>  token to receive
  amount <value>    amount to send          quick <chain>    destination + instant quote
  quote             quote now               swap             execute the current quote
  submit            swap if quoted, else quote
  status            show the form           chains           list chains
  help              this text               quit             exit";

/// One parsed line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Input(InputChange),
    Quick(String),
    Quote,
    Swap,
    Submit,
    Status,
    Chains,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse a raw line. Chain ids are lower-cased, token symbols upper-cased;
    /// a bare keyword with no value clears that field.
    pub fn parse(raw: &str) -> Option<Self> {
        let line = raw.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        let chain = || rest.to_lowercase();
        let token = || rest.to_uppercase();

        match word.to_lowercase().as_str() {
            "from" => Some(Self::Input(InputChange::Chain(Leg::From, chain()))),
            "to" => Some(Self::Input(InputChange::Chain(Leg::To, chain()))),
            "send" => Some(Self::Input(InputChange::Token(Leg::From, token()))),
            "receive" => Some(Self::Input(InputChange::Token(Leg::To, token()))),
            "amount" => Some(Self::Input(InputChange::Amount(rest.to_string()))),
            "quick" if !rest.is_empty() => Some(Self::Quick(chain())),
            "quote" if rest.is_empty() => Some(Self::Quote),
            "swap" if rest.is_empty() => Some(Self::Swap),
            "submit" if rest.is_empty() => Some(Self::Submit),
            "status" if rest.is_empty() => Some(Self::Status),
            "chains" if rest.is_empty() => Some(Self::Chains),
            "help" | "?" if rest.is_empty() => Some(Self::Help),
            "quit" | "exit" if rest.is_empty() => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Reads commands from stdin, one per line, and forwards them to the
/// controller until `quit` or end of input.
pub async fn run_stdin(config: &Config, handle: ControllerHandle) {
    tracing::info!("console started (stdin mode)");
    println!("{HELP}");

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let raw = line.trim().to_string();
                if raw.is_empty() {
                    continue;
                }

                let Some(command) = ConsoleCommand::parse(&raw) else {
                    tracing::warn!(input = raw, "unknown command, ignoring");
                    continue;
                };

                if !dispatch(config, &handle, command).await {
                    return;
                }
            }
            Ok(None) => {
                tracing::info!("stdin closed — console stopping");
                let _ = handle.send(Command::Shutdown);
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "stdin read error");
                let _ = handle.send(Command::Shutdown);
                return;
            }
        }
    }
}

/// Returns false when the console should stop.
async fn dispatch(config: &Config, handle: &ControllerHandle, command: ConsoleCommand) -> bool {
    let delivered = match command {
        ConsoleCommand::Input(change) => handle.input(change),
        ConsoleCommand::Quick(chain) => {
            if !config.is_quick_chain(&chain) {
                tracing::debug!(chain, "quick chain not in QUICK_CHAINS, sending anyway");
            }
            handle.quick_chain(chain)
        }
        ConsoleCommand::Quote => handle.send(Command::RequestQuote),
        ConsoleCommand::Swap => handle.execute(),
        ConsoleCommand::Submit => handle.send(Command::Submit),
        ConsoleCommand::Status => match handle.snapshot().await {
            Some(snap) => {
                print_selection(&snap.selection);
                println!("  phase: {:?}  quote held: {}", snap.phase, snap.current_quote.is_some());
                true
            }
            None => false,
        },
        ConsoleCommand::Chains => handle.send(Command::ShowChains),
        ConsoleCommand::Help => {
            println!("{HELP}");
            if !config.quick_chains.is_empty() {
                println!("quick chains: {}", config.quick_chains.join(", "));
            }
            true
        }
        ConsoleCommand::Quit => {
            tracing::info!("quit requested — console stopping");
            let _ = handle.send(Command::Shutdown);
            return false;
        }
    };

    if !delivered {
        tracing::error!("controller stopped");
    }
    delivered
}

fn print_selection(selection: &Selection) {
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    println!(
        "  send {} {} on {} → receive {} on {}",
        or_dash(&selection.amount),
        or_dash(&selection.from_token),
        or_dash(&selection.from_chain),
        or_dash(&selection.to_token),
        or_dash(&selection.to_chain),
    );
}

/// Prints the quote workflow to stdout.
#[derive(Debug)]
pub struct TerminalView {
    submit_enabled: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self { submit_enabled: true }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteView for TerminalView {
    fn show_chains(&mut self, options: &[ChainOption]) {
        if options.is_empty() {
            println!("no chains available");
            return;
        }
        println!("chains:");
        for opt in options {
            println!("  {:<12} {}", opt.id, opt.label);
        }
    }

    fn show_tokens(&mut self, leg: Leg, tokens: &[String]) {
        if !tokens.is_empty() {
            println!("{leg} tokens: {}", tokens.join(", "));
        }
    }

    fn clear_quote(&mut self) {}

    fn show_loading(&mut self) {
        println!("getting quote…");
    }

    fn show_quote(&mut self, quote: &QuoteDisplay) {
        let impact = match quote.impact_level {
            PriceImpactLevel::Low => "",
            PriceImpactLevel::Elevated => "  (elevated)",
            PriceImpactLevel::High => "  (HIGH)",
        };
        println!("┌ cross-chain quote");
        println!("│ you send     {} on {}", quote.send, quote.send_chain);
        println!("│ you receive  {} on {}", quote.receive, quote.receive_chain);
        println!("│ bridge fee   {}   gas {}", quote.bridge_fee, quote.gas_estimate);
        println!("│ total fees   {}", quote.total_fee);
        println!("│ price impact {}{impact}", quote.price_impact);
        println!("│ route        {}  est. {}", quote.route, quote.estimated_time);
        if self.submit_enabled {
            println!("└ type `swap` to execute");
        } else {
            println!("└");
        }
    }

    fn show_quote_error(&mut self, message: &str) {
        println!("quote error: {message}");
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
        if !enabled {
            println!("submitting swap…");
        }
    }

    fn notify(&mut self, notice: Notice) {
        println!("[{}] {}", notice.kind, notice.message);
    }

    fn reset_form(&mut self, selection: &Selection) {
        println!("form reset");
        print_selection(selection);
    }
}
