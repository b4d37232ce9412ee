use std::collections::BTreeMap;

use crate::model::{
    DOCUMENT_STRATEGY_DIR, MIRROR_STRATEGY_DIR, OverallVerdict, StrategyReport,
    TREE_STRATEGY_DIR, Verdict,
};

/// Decision table over which strategies came out `COMPLETE`.
///
/// The section tree is preferred whenever it is complete; otherwise the
/// complete alternates are named; with none complete the result is a
/// manual-review warning. Every combination has exactly one arm.
pub fn recommend(tree_complete: bool, document_complete: bool, mirror_complete: bool) -> String {
    match (tree_complete, document_complete, mirror_complete) {
        (true, true, _) => format!(
            "Use {DOCUMENT_STRATEGY_DIR}/ or {TREE_STRATEGY_DIR}/ for curation (both complete)"
        ),
        (true, false, true) => {
            format!("Use {TREE_STRATEGY_DIR}/ for curation (most complete)")
        }
        (true, false, false) => {
            format!("Use {TREE_STRATEGY_DIR}/ for curation (only complete source)")
        }
        (false, true, true) => format!(
            "Use {DOCUMENT_STRATEGY_DIR}/ or {MIRROR_STRATEGY_DIR}/ for curation ({TREE_STRATEGY_DIR}/ is not complete; re-run scrape)"
        ),
        (false, true, false) => format!(
            "Use {DOCUMENT_STRATEGY_DIR}/ for curation ({TREE_STRATEGY_DIR}/ is not complete; re-run scrape)"
        ),
        (false, false, true) => format!(
            "Use {MIRROR_STRATEGY_DIR}/ for curation ({TREE_STRATEGY_DIR}/ is not complete; re-run scrape)"
        ),
        (false, false, false) => {
            "WARNING: No complete scraper output found. Manual review required.".to_string()
        }
    }
}

/// Bucket strategies by verdict and attach the recommendation.
pub fn summarize(strategies: &BTreeMap<String, StrategyReport>) -> OverallVerdict {
    let named = |verdict: Verdict| {
        strategies
            .iter()
            .filter(|(_, report)| report.verdict == verdict)
            .map(|(name, _)| name.clone())
            .collect::<Vec<String>>()
    };
    let is_complete = |name: &str| {
        strategies
            .get(name)
            .is_some_and(|report| report.verdict == Verdict::Complete)
    };

    OverallVerdict {
        complete: named(Verdict::Complete),
        incomplete: named(Verdict::Incomplete),
        missing: named(Verdict::Missing),
        errored: named(Verdict::Error),
        recommendation: recommend(
            is_complete(TREE_STRATEGY_DIR),
            is_complete(DOCUMENT_STRATEGY_DIR),
            is_complete(MIRROR_STRATEGY_DIR),
        ),
    }
}
