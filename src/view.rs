use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::selection::Selection;
use crate::types::{ChainCatalog, Leg, Quote};

/// Rendering sink for the quote workflow. The controller calls these from its
/// own task only, one at a time.
pub trait QuoteView: Send + 'static {
    fn show_chains(&mut self, options: &[ChainOption]);
    fn show_tokens(&mut self, leg: Leg, tokens: &[String]);
    fn clear_quote(&mut self);
    fn show_loading(&mut self);
    fn show_quote(&mut self, quote: &QuoteDisplay);
    fn show_quote_error(&mut self, message: &str);
    fn set_submit_enabled(&mut self, enabled: bool);
    fn notify(&mut self, notice: Notice);
    fn reset_form(&mut self, selection: &Selection);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainOption {
    pub id: String,
    pub label: String,
    pub enabled: bool,
}

pub fn chain_options(catalog: &ChainCatalog) -> Vec<ChainOption> {
    catalog
        .iter()
        .map(|chain| {
            let mut label = format!("{} ({})", chain.name, chain.native_token_symbol);
            if !chain.rpc_connected {
                label.push_str(" - Offline");
            }
            ChainOption {
                id: chain.id.clone(),
                label,
                enabled: chain.rpc_connected,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoticeKind::Success => write!(f, "OK"),
            NoticeKind::Warning => write!(f, "WARN"),
            NoticeKind::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }
}

/// How alarming a quote's price impact is: above 3% is high, above 1% elevated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceImpactLevel {
    Low,
    Elevated,
    High,
}

impl PriceImpactLevel {
    pub fn classify(pct: Decimal) -> Self {
        if pct > Decimal::from(3) {
            Self::High
        } else if pct > Decimal::ONE {
            Self::Elevated
        } else {
            Self::Low
        }
    }
}

/// A quote with every figure already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteDisplay {
    pub send: String,
    pub send_chain: String,
    pub receive: String,
    pub receive_chain: String,
    pub amount_out: String,
    pub bridge_fee: String,
    pub gas_estimate: String,
    pub total_fee: String,
    pub price_impact: String,
    pub impact_level: PriceImpactLevel,
    pub route: String,
    pub estimated_time: String,
}

impl QuoteDisplay {
    pub fn from_quote(quote: &Quote) -> Self {
        let amount_out = fixed(quote.amount_out, 6);
        Self {
            send: format!("{} {}", quote.amount_in.normalize(), quote.from_token),
            send_chain: quote.from_chain.clone(),
            receive: format!("{amount_out} {}", quote.to_token),
            receive_chain: quote.to_chain.clone(),
            amount_out,
            bridge_fee: usd(quote.bridge_fee_usd),
            gas_estimate: usd(quote.gas_estimate_usd),
            total_fee: usd(quote.total_fee_usd),
            price_impact: format!("{}%", fixed(quote.price_impact_pct, 2)),
            impact_level: PriceImpactLevel::classify(quote.price_impact_pct),
            route: quote.route.name.clone(),
            estimated_time: quote.estimated_time.clone(),
        }
    }
}

/// Round half away from zero to `dp` places and pad with zeros.
pub fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

fn usd(value: Decimal) -> String {
    format!("${}", fixed(value, 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fixed_pads_and_rounds() {
        assert_eq!(fixed(dec!(1.5), 6), "1.500000");
        assert_eq!(fixed(dec!(0.1234565), 6), "0.123457");
        assert_eq!(fixed(dec!(2), 2), "2.00");
        assert_eq!(fixed(dec!(0.005), 2), "0.01");
    }

    #[test]
    fn impact_thresholds() {
        assert_eq!(PriceImpactLevel::classify(dec!(0.5)), PriceImpactLevel::Low);
        assert_eq!(PriceImpactLevel::classify(dec!(1)), PriceImpactLevel::Low);
        assert_eq!(PriceImpactLevel::classify(dec!(1.01)), PriceImpactLevel::Elevated);
        assert_eq!(PriceImpactLevel::classify(dec!(3)), PriceImpactLevel::Elevated);
        assert_eq!(PriceImpactLevel::classify(dec!(3.2)), PriceImpactLevel::High);
    }
}
