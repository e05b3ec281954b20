//! Recovery pass for intents left `pending` by an interrupted request.
//!
//! A pending intent means the process stopped between the local write and the
//! conf confirmation, so neither side can be trusted. The pass undoes the local
//! write and then asks the conf service to resync that rate name, which brings
//! both systems back to the pre-request state.

use chrono::Utc;
use conf_client::ConfAction;
use postgres_models::{Compensation, IntentAction, IntentState, RateIntent};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::ports::StoreError;
use crate::saga::apply_compensation;
use crate::v1::call_rates::RateDispatcher;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub compensated: usize,
    /// Dropped because a later change to the same rate took over.
    pub superseded: usize,
    /// Left pending for the next pass.
    pub deferred: usize,
    pub failed: usize,
}

/// Compensate every intent that has been pending for longer than `grace`.
///
/// An intent is only compensated while it is the latest live change to its
/// rate. Once a later change was committed (or is itself pending), undoing the
/// older one would overwrite newer state, so it is marked superseded instead.
pub async fn reconcile_pending(
    dispatcher: &RateDispatcher,
    grace: Duration,
) -> Result<ReconcileReport, StoreError> {
    let grace = chrono::Duration::from_std(grace).unwrap_or_else(|_| chrono::Duration::zero());
    let pending = dispatcher.intents().pending_intents(Utc::now() - grace).await?;

    let mut report = ReconcileReport::default();
    if pending.is_empty() {
        return Ok(report);
    }

    let reachable = dispatcher.conf().is_reachable().await;
    if !reachable {
        warn!(pending = pending.len(), "conf service unreachable, deferring reconciliation");
    }

    for intent in pending {
        if dispatcher.intents().superseded(&intent).await? {
            let settled = dispatcher
                .intents()
                .settle_intent(
                    intent.id,
                    IntentState::Superseded,
                    Some("superseded by a later change to the rate".to_string()),
                )
                .await?;
            if settled {
                info!(intent_id = %intent.id, rate_name = %intent.rate_name, "intent superseded");
                report.superseded += 1;
            }
            continue;
        }

        let compensation = match intent.compensation() {
            Ok(compensation) => compensation,
            Err(err) => {
                error!(intent_id = %intent.id, error = %err, "unreadable compensation");
                dispatcher
                    .intents()
                    .settle_intent(
                        intent.id,
                        IntentState::Failed,
                        Some(format!("unreadable compensation: {}", err)),
                    )
                    .await?;
                report.failed += 1;
                continue;
            }
        };

        if !reachable {
            report.deferred += 1;
            continue;
        }

        if let Err(err) = apply_compensation(dispatcher.store(), &compensation).await {
            warn!(intent_id = %intent.id, error = %err, "compensation failed, retrying next pass");
            report.deferred += 1;
            continue;
        }

        let (action, name) = resync_target(&intent, &compensation);
        match dispatcher.conf().notify(action, &name).await {
            Ok(response) if response.is_complete() => {
                let settled = dispatcher
                    .intents()
                    .settle_intent(
                        intent.id,
                        IntentState::Compensated,
                        Some("reconciled after interrupted request".to_string()),
                    )
                    .await?;
                if settled {
                    info!(intent_id = %intent.id, ?action, name = %name, "intent reconciled");
                    report.compensated += 1;
                } else {
                    warn!(intent_id = %intent.id, "intent settled during reconciliation");
                }
            }
            Ok(response) => {
                warn!(intent_id = %intent.id, state = %response.state, "conf resync rejected");
                report.deferred += 1;
            }
            Err(err) => {
                warn!(intent_id = %intent.id, error = %err, "conf resync failed");
                report.deferred += 1;
            }
        }
    }

    Ok(report)
}

/// Conf action that makes the conf service match the compensated local state.
fn resync_target(intent: &RateIntent, compensation: &Compensation) -> (ConfAction, String) {
    match compensation {
        Compensation::DeleteCreated { name } => (ConfAction::Delete, name.clone()),
        Compensation::RestoreRow { row } if intent.action() == Some(IntentAction::Delete) => {
            (ConfAction::Create, row.name.clone())
        }
        Compensation::RestoreRow { row } => (ConfAction::Update, row.name.clone()),
        Compensation::RestoreStatus { .. } => (ConfAction::Update, intent.rate_name.clone()),
    }
}

/// Run the pass now and then every `interval`.
pub fn spawn_reconciler(
    dispatcher: RateDispatcher,
    grace: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // `interval` panics on a zero period.
        let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            match reconcile_pending(&dispatcher, grace).await {
                Ok(report) if report == ReconcileReport::default() => {}
                Ok(report) => info!(?report, "reconciliation pass finished"),
                Err(err) => error!(error = %err, "reconciliation pass failed"),
            }
        }
    })
}
