//! Single publishing run.
//!
//! One invocation walks `FETCHED -> FILTERED -> SELECTED -> PUBLISHED ->
//! COMMITTED` and stops early in a no-op state when there is nothing to
//! post. Only an unconfirmed publish (or unusable state file) ends in
//! `Failed`.

use chrono::{DateTime, Utc};
use tokio::time::timeout;

use crate::config::Config;
use crate::error::AppError;
use crate::filter::filter_and_sort;
use crate::message::build_message;
use crate::provider::{CouponSource, DurableSync, PostingApi};
use crate::publisher::publish;
use crate::selector::select;
use crate::state::StateStore;

/// Why a run finished without posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// The feed returned nothing, or could not be fetched.
    EmptyFeed,
    /// Every record was invisible, expired or malformed.
    NoValidCoupons,
    NothingSelected,
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunOutcome {
    NoOp(NoOpReason),
    Committed {
        coupon_id: u64,
        post_id: String,
        reset: bool,
        /// `false` when the post went out but the state file could not be saved.
        saved: bool,
    },
    Failed(AppError),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::NoOp(_) | RunOutcome::Committed { .. } => 0,
            RunOutcome::Failed(err) => err.exit_code(),
        }
    }
}

/// The external collaborators a run talks to.
pub struct Collaborators<'a> {
    pub source: &'a (dyn CouponSource + Send + Sync),
    pub api: &'a (dyn PostingApi + Send + Sync),
    pub sync: &'a (dyn DurableSync + Send + Sync),
    pub store: &'a StateStore,
}

/// Execute one run against the current clock.
pub async fn run_once(config: &Config, deps: &Collaborators<'_>) -> RunOutcome {
    run_once_at(config, deps, Utc::now()).await
}

/// Execute one run as if the clock read `now`. Extracted for testability.
pub async fn run_once_at(
    config: &Config,
    deps: &Collaborators<'_>,
    now: DateTime<Utc>,
) -> RunOutcome {
    let mut state = match deps.store.load() {
        Ok(state) => state,
        Err(err) => {
            tracing::error!("Cannot use state file, aborting before posting: {}", err);
            return RunOutcome::Failed(err);
        }
    };

    // FETCHED
    let raw = match deps.source.fetch_coupons().await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(
                "Failed to fetch coupons from {}: {}",
                deps.source.source_name(),
                err
            );
            Vec::new()
        }
    };
    if raw.is_empty() {
        tracing::info!("No coupons fetched. Exiting.");
        return RunOutcome::NoOp(NoOpReason::EmptyFeed);
    }

    // FILTERED
    let valid = filter_and_sort(&raw, now);
    if valid.is_empty() {
        tracing::info!("No valid (visible and not expired) coupons found.");
        return RunOutcome::NoOp(NoOpReason::NoValidCoupons);
    }

    // SELECTED
    let Some(selection) = select(&valid, &state.published_ids) else {
        tracing::info!("No coupon to post. Exiting.");
        return RunOutcome::NoOp(NoOpReason::NothingSelected);
    };
    let coupon = selection.coupon;
    tracing::info!(
        "Selected coupon {} ({} postable, {} already published)",
        coupon.id,
        valid.len(),
        selection.published.len()
    );

    // PUBLISHED
    let message = build_message(coupon, &config.site_url, config.message_max_length);
    let post = match publish(deps.api, coupon, &message).await {
        Ok(post) => post,
        Err(err) => {
            tracing::error!("Publishing coupon {} failed: {}", coupon.id, err);
            return RunOutcome::Failed(err);
        }
    };
    tracing::info!("Posted coupon {} successfully (post id {})", coupon.id, post.post_id);

    // COMMITTED
    state.published_ids = selection.published;
    state.record(coupon.id, now);

    let saved = match deps.store.save(&state) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!("Failed updating state after post: {}", err);
            false
        }
    };

    if saved {
        let description = format!("chore: mark coupon {} as published", coupon.id);
        let limit = config.request_timeout();
        let synced = timeout(limit, deps.sync.sync(deps.store.path(), &description))
            .await
            .unwrap_or_else(|_| {
                Err(AppError::Persistence(format!(
                    "sync timed out after {}s",
                    limit.as_secs()
                )))
            });
        if let Err(err) = synced {
            tracing::error!("State sync failed (next run may repost): {}", err);
        }
    }

    RunOutcome::Committed {
        coupon_id: coupon.id,
        post_id: post.post_id,
        reset: selection.reset,
        saved,
    }
}
