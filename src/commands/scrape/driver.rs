use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::poller::{PollOutcome, heading_probe, wait_for_change};
use super::writer::{SectionCapture, SectionWriter};
use super::{CaptureFailure, TargetState, TargetWarning};
use crate::browser::{BrowserError, PageSession, Probe};
use crate::config::DriverTiming;
use crate::dom::{NavigationTarget, discover_targets, reduce_document};
use crate::model::NavigationMethod;
use crate::route::{RouteIdentity, parse_hash_route};

/// Final record of one target's trip through the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub url: String,
    pub state: TargetState,
    pub warnings: Vec<TargetWarning>,
}

#[derive(Debug)]
struct Capture {
    route: RouteIdentity,
    content: String,
    navigation: NavigationMethod,
    poll: PollOutcome,
}

struct Tracker {
    url: String,
    state: TargetState,
    warnings: Vec<TargetWarning>,
}

impl Tracker {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            state: TargetState::Discovered,
            warnings: Vec::new(),
        }
    }

    fn advance(&mut self, next: TargetState) {
        debug!(
            url = %self.url,
            from = self.state.as_str(),
            to = next.as_str(),
            "target transition"
        );
        self.state = next;
    }

    fn warn(&mut self, warning: TargetWarning) {
        self.warnings.push(warning);
    }

    fn finish(self) -> TargetOutcome {
        TargetOutcome {
            url: self.url,
            state: self.state,
            warnings: self.warnings,
        }
    }
}

/// Drives one exclusively borrowed page through every navigation target.
pub struct Navigator<'a, S: PageSession + ?Sized> {
    page: &'a mut S,
    timing: DriverTiming,
}

impl<'a, S: PageSession + ?Sized> Navigator<'a, S> {
    pub fn new(page: &'a mut S, timing: DriverTiming) -> Self {
        Self { page, timing }
    }

    /// Load the entry point, let the app render, and collect its targets.
    pub async fn discover(&mut self, base_url: &str) -> Result<Vec<NavigationTarget>, BrowserError> {
        self.page.goto(base_url).await?;
        tokio::time::sleep(self.timing.initial_wait).await;

        let html = self.page.evaluate(Probe::DocumentHtml).await?;
        let location = self.page.evaluate(Probe::LocationHref).await?;
        let page_url = location.as_str().unwrap_or(base_url);

        Ok(discover_targets(html.as_str().unwrap_or_default(), page_url))
    }

    async fn capture(
        &mut self,
        target: &NavigationTarget,
        tracker: &mut Tracker,
    ) -> Result<Capture, CaptureFailure> {
        let route = parse_hash_route(&target.url).ok_or_else(|| CaptureFailure::Unroutable {
            url: target.url.clone(),
        })?;

        let baseline = heading_probe(&mut *self.page).await?;

        let navigation = if self.page.locate_and_activate(&target.fragment).await? {
            debug!(url = %target.url, "activated in-app link");
            NavigationMethod::Click
        } else {
            warn!(url = %target.url, fragment = %target.fragment, "no in-app link matched, assigning location hash");
            self.page.assign_fragment(&target.fragment).await?;
            tracker.warn(TargetWarning::NavigationFallback);
            NavigationMethod::FragmentFallback
        };
        tracker.advance(TargetState::Triggered);

        tracker.advance(TargetState::Polling);
        let poll = wait_for_change(&mut *self.page, baseline.as_deref(), self.timing.poll).await?;
        if poll.changed {
            debug!(
                url = %target.url,
                waited_ms = u64::from(poll.attempts_used) * self.timing.poll.interval.as_millis() as u64,
                heading = %poll.final_probe.as_deref().unwrap_or_default(),
                "content updated"
            );
        } else {
            warn!(
                url = %target.url,
                attempts = poll.attempts_used,
                heading = %baseline.as_deref().unwrap_or("<none>"),
                "heading did not change, capturing current content"
            );
            tracker.warn(TargetWarning::ChangeDetectionTimeout {
                attempts: poll.attempts_used,
            });
        }

        tokio::time::sleep(self.timing.settle_wait).await;

        let html = self.page.evaluate(Probe::DocumentHtml).await?;
        let content = reduce_document(html.as_str().unwrap_or_default()).ok_or_else(|| {
            CaptureFailure::ContentRootMissing {
                url: target.url.clone(),
            }
        })?;
        if content.is_empty() {
            return Err(CaptureFailure::EmptyContent {
                url: target.url.clone(),
            });
        }

        tracker.advance(if poll.changed {
            TargetState::Captured
        } else {
            TargetState::CapturedWithWarning
        });

        Ok(Capture {
            route,
            content,
            navigation,
            poll,
        })
    }
}

/// Visit every target in discovery order, strictly one at a time.
///
/// Only session-level problems (entry point unreachable, browser connection
/// lost, output not writable) end the run early; a target that fails is
/// recorded and skipped.
pub async fn crawl<S: PageSession + ?Sized>(
    page: &mut S,
    base_url: &str,
    writer: &mut SectionWriter,
    timing: DriverTiming,
) -> Result<Vec<TargetOutcome>> {
    let mut navigator = Navigator::new(page, timing);

    let targets = navigator
        .discover(base_url)
        .await
        .with_context(|| format!("navigation discovery failed for {base_url}"))?;

    if targets.is_empty() {
        warn!(url = base_url, "no navigation targets discovered");
    } else {
        info!(targets = targets.len(), "discovered navigation targets");
    }

    let total = targets.len();
    let mut outcomes = Vec::with_capacity(total);
    for (index, target) in targets.iter().enumerate() {
        info!(
            progress = %format!("{}/{}", index + 1, total),
            url = %target.url,
            "capturing section"
        );

        let mut tracker = Tracker::new(&target.url);
        match navigator.capture(target, &mut tracker).await {
            Ok(capture) => {
                let record = writer.write_section(SectionCapture {
                    url: &target.url,
                    route: &capture.route,
                    content: &capture.content,
                    navigation: capture.navigation,
                    content_changed: capture.poll.changed,
                    poll_attempts: capture.poll.attempts_used,
                })?;
                tracker.advance(TargetState::Written);
                info!(file = %record.relative_file_path, bytes = record.byte_size, "saved section");
            }
            Err(CaptureFailure::Browser(err)) if err.is_session_fatal() => {
                tracker.advance(TargetState::Errored);
                return Err(anyhow::Error::new(err).context(format!(
                    "browser session lost while capturing {}",
                    target.url
                )));
            }
            Err(failure) => {
                warn!(url = %target.url, error = %failure, "capture failed, skipping target");
                tracker.advance(TargetState::Errored);
                writer.record_failure(&target.url, failure.to_string());
            }
        }
        outcomes.push(tracker.finish());
    }

    info!(
        discovered = total,
        captured = writer.captured(),
        "navigation run finished"
    );
    Ok(outcomes)
}
