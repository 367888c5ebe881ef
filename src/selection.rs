use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{Leg, QuoteRequest};

/// Live state of the swap form. Empty strings mean "nothing selected",
/// matching the placeholder option of a selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub from_chain: String,
    pub to_chain: String,
    pub from_token: String,
    pub to_token: String,
    /// Raw amount text as typed; parsed only when a request is built.
    pub amount: String,
}

/// A single edit to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputChange {
    Chain(Leg, String),
    Token(Leg, String),
    Amount(String),
}

impl std::fmt::Display for InputChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chain(leg, chain) => write!(f, "{leg} chain = {chain}"),
            Self::Token(leg, token) => write!(f, "{leg} token = {token}"),
            Self::Amount(raw) => write!(f, "amount = {raw}"),
        }
    }
}

impl Selection {
    pub fn chain(&self, leg: Leg) -> &str {
        match leg {
            Leg::From => &self.from_chain,
            Leg::To => &self.to_chain,
        }
    }

    pub fn token(&self, leg: Leg) -> &str {
        match leg {
            Leg::From => &self.from_token,
            Leg::To => &self.to_token,
        }
    }

    pub fn set_chain(&mut self, leg: Leg, chain: String) {
        match leg {
            Leg::From => self.from_chain = chain,
            Leg::To => self.to_chain = chain,
        }
    }

    pub fn set_token(&mut self, leg: Leg, token: String) {
        match leg {
            Leg::From => self.from_token = token,
            Leg::To => self.to_token = token,
        }
    }

    pub fn apply(&mut self, change: InputChange) {
        match change {
            InputChange::Chain(leg, chain) => self.set_chain(leg, chain),
            InputChange::Token(leg, token) => self.set_token(leg, token),
            InputChange::Amount(raw) => self.amount = raw,
        }
    }

    /// Positive amount in plain decimal notation (no exponent), or `None`.
    pub fn parsed_amount(&self) -> Option<Decimal> {
        let raw = self.amount.trim();
        if raw.is_empty() {
            return None;
        }
        Decimal::from_str(raw)
            .ok()
            .filter(|amount| *amount > Decimal::ZERO)
    }

    /// Build the wire request, or `None` when any field is missing.
    pub fn to_request(&self) -> Option<QuoteRequest> {
        let filled = |s: &str| !s.trim().is_empty();
        if !filled(&self.from_chain)
            || !filled(&self.to_chain)
            || !filled(&self.from_token)
            || !filled(&self.to_token)
        {
            return None;
        }
        let amount = self.parsed_amount()?;

        Some(QuoteRequest {
            from_chain: self.from_chain.trim().to_string(),
            to_chain: self.to_chain.trim().to_string(),
            from_token: self.from_token.trim().to_string(),
            to_token: self.to_token.trim().to_string(),
            amount,
        })
    }
}
