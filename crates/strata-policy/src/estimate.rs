//! Cost/time estimation: a pure function of `(size, strategy)`
//! (`spec.md` §4.D, §4.E).

use strata_protocol::{Estimate, Strategy};

/// Rough tokens-per-dollar rate, matching `spec.md` §4.C's default LLM
/// cost rate (`tokens / 1000 * 0.002`).
const COST_PER_1K_TOKENS: f64 = 0.002;

/// `tokens ≈ size_bytes / 4` (`spec.md` §4.D).
fn estimate_tokens(size_bytes: u64, strategy: Strategy) -> u64 {
    match strategy {
        Strategy::Skip => 0,
        // Vision payloads are dominated by the base64-encoded image, not
        // the textual prompt; approximate from size directly rather than
        // a token count that has no real meaning here.
        Strategy::VlmExtract => (size_bytes / 3).max(512),
        _ => size_bytes / 4,
    }
}

fn estimate_time_seconds(strategy: Strategy, tokens: u64) -> f64 {
    match strategy {
        Strategy::Skip => 0.0,
        Strategy::ParserOnly => 0.2,
        Strategy::ParserPlusLlm => 3.0 + (tokens as f64 / 2000.0),
        Strategy::LlmOnly => 2.0 + (tokens as f64 / 2000.0),
        Strategy::VlmExtract => 5.0,
    }
}

/// Estimate `{tokens, cost_usd, time_seconds}` for one plan item.
pub fn estimate(size_bytes: u64, strategy: Strategy) -> Estimate {
    let tokens = estimate_tokens(size_bytes, strategy);
    let cost_usd = (tokens as f64 / 1000.0) * COST_PER_1K_TOKENS;
    let time_seconds = estimate_time_seconds(strategy, tokens);
    Estimate { tokens, cost_usd, time_seconds }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_strategy_is_free() {
        let e = estimate(50_000, Strategy::Skip);
        assert_eq!(e.tokens, 0);
        assert_eq!(e.cost_usd, 0.0);
        assert_eq!(e.time_seconds, 0.0);
    }

    #[test]
    fn parser_only_has_nonzero_tokens_but_minimal_time() {
        let e = estimate(4000, Strategy::ParserOnly);
        assert_eq!(e.tokens, 1000);
        assert!(e.time_seconds < 1.0);
    }

    #[test]
    fn cost_scales_with_tokens() {
        let small = estimate(4000, Strategy::LlmOnly);
        let large = estimate(40_000, Strategy::LlmOnly);
        assert!(large.cost_usd > small.cost_usd);
    }
}
