use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which half of the swap form a selector belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    From,
    To,
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leg::From => write!(f, "from"),
            Leg::To => write!(f, "to"),
        }
    }
}

/// One chain as advertised by `/api/supported_chains`.
/// The id is the key of the response map, so it is filled in after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(rename = "native_token")]
    pub native_token_symbol: String,
    #[serde(default)]
    pub rpc_connected: bool,
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl ChainDescriptor {
    pub fn offers(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

/// Snapshot of the backend's chain list, keyed by chain id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainCatalog {
    chains: BTreeMap<String, ChainDescriptor>,
}

impl ChainCatalog {
    pub fn new(chains: BTreeMap<String, ChainDescriptor>) -> Self {
        let chains = chains
            .into_iter()
            .map(|(id, mut chain)| {
                chain.id = id.clone();
                (id, chain)
            })
            .collect();
        Self { chains }
    }

    pub fn get(&self, id: &str) -> Option<&ChainDescriptor> {
        self.chains.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.values()
    }

    /// A chain can be picked only if it is known and its RPC is up.
    pub fn is_selectable(&self, id: &str) -> bool {
        self.get(id).is_some_and(|c| c.rpc_connected)
    }

    pub fn tokens(&self, id: &str) -> &[String] {
        self.get(id).map(|c| c.tokens.as_slice()).unwrap_or(&[])
    }
}

/// Body of both the quote and the execute endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteRequest {
    pub from_chain: String,
    pub to_chain: String,
    pub from_token: String,
    pub to_token: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl std::fmt::Display for QuoteRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} on {} → {} on {}",
            self.amount, self.from_token, self.from_chain, self.to_token, self.to_chain
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub from_chain: String,
    pub to_chain: String,
    pub from_token: String,
    pub to_token: String,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    #[serde(rename = "bridge_fee")]
    pub bridge_fee_usd: Decimal,
    #[serde(rename = "gas_estimate")]
    pub gas_estimate_usd: Decimal,
    pub total_fee_usd: Decimal,
    #[serde(rename = "price_impact")]
    pub price_impact_pct: Decimal,
    pub route: Route,
    #[serde(default)]
    pub estimated_time: String,
}

impl Quote {
    /// The request that executes exactly this quote. Only quoted fields are
    /// used, never whatever the form holds now.
    pub fn execution_request(&self) -> QuoteRequest {
        QuoteRequest {
            from_chain: self.from_chain.clone(),
            to_chain: self.to_chain.clone(),
            from_token: self.from_token.clone(),
            to_token: self.to_token.clone(),
            amount: self.amount_in,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Shared response shape of every backend endpoint:
/// `{ success, message?, ...payload }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

#[derive(Debug, Deserialize)]
pub struct ChainsPayload {
    #[serde(default)]
    pub chains: Option<BTreeMap<String, ChainDescriptor>>,
}

#[derive(Debug, Deserialize)]
pub struct QuotePayload {
    #[serde(default)]
    pub quote: Option<Quote>,
}
