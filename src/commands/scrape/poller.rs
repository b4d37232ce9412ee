use crate::browser::{BrowserError, PageSession, Probe};
use crate::config::PollBudget;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub changed: bool,
    pub attempts_used: u32,
    pub final_probe: Option<String>,
}

pub async fn heading_probe<S: PageSession + ?Sized>(
    page: &mut S,
) -> Result<Option<String>, BrowserError> {
    let value = page.evaluate(Probe::HeadingText).await?;
    Ok(value.as_str().map(ToOwned::to_owned))
}

/// Re-sample the heading probe after each interval until it shows a value
/// different from `baseline`, or the budget runs out.
///
/// A probe that disappears (null) or reads empty never counts as a change.
pub async fn wait_for_change<S: PageSession + ?Sized>(
    page: &mut S,
    baseline: Option<&str>,
    budget: PollBudget,
) -> Result<PollOutcome, BrowserError> {
    let mut final_probe = baseline.map(ToOwned::to_owned);

    for attempt in 1..=budget.attempts {
        tokio::time::sleep(budget.interval).await;

        let probe = heading_probe(page).await?;
        let changed = probe
            .as_deref()
            .filter(|current| !current.is_empty())
            .is_some_and(|current| Some(current) != baseline);
        final_probe = probe;

        if changed {
            return Ok(PollOutcome {
                changed: true,
                attempts_used: attempt,
                final_probe,
            });
        }
    }

    Ok(PollOutcome {
        changed: false,
        attempts_used: budget.attempts,
        final_probe,
    })
}
