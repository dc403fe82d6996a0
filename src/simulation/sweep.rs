use std::collections::BTreeSet;

use futures::{StreamExt, stream};
use log::{debug, info, warn};

use crate::{
    PitwallError,
    prediction::{PredictionRecord, decode},
    track::TrackId,
};

use super::{
    ENTRY_POINT, GridPositions, RaceConditions,
    invoker::{SimulationInvoker, paced},
    orchestrator::RunToken,
    strategy_args, strategy_kind,
};

/// Aggregate of a strategy sweep across starting positions
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepOutcome {
    /// Records from every position that produced any, in grid position order
    pub records: Vec<PredictionRecord>,
    /// Rows dropped by the decoder, summed over all positions
    pub rejected: usize,
    /// Positions that produced nothing usable
    pub failures: BTreeSet<u8>,
}

impl SweepOutcome {
    pub fn all_failed(&self, grid: &GridPositions) -> bool {
        self.failures.len() == grid.len()
    }
}

/// Run the strategy module once per grid position and gather the results.
///
/// Up to `concurrency` positions are in flight at a time, results are still merged in
/// position order. A position fails when its call fails or when every row it returned was
/// rejected. Failed positions are recorded and the sweep carries on. Positions not yet
/// started when `token` goes stale are skipped. The pacing floor covers the whole sweep,
/// not each call.
pub async fn run_sweep(
    invoker: &SimulationInvoker,
    track: TrackId,
    conditions: RaceConditions,
    grid: GridPositions,
    concurrency: usize,
    token: &RunToken,
) -> SweepOutcome {
    info!(
        "Strategy sweep for track {} over positions {:?} ({} at a time)",
        track,
        grid.positions(),
        concurrency.max(1)
    );

    paced(invoker.config().min_duration, async {
        let results: Vec<(u8, Option<Result<_, PitwallError>>)> = stream::iter(grid.positions())
            .map(|position| async move {
                if !token.is_current() {
                    return (position, None);
                }
                (
                    position,
                    Some(sweep_position(invoker, track, &conditions, position).await),
                )
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut outcome = SweepOutcome::default();
        for (position, result) in results {
            match result {
                None => debug!("Skipped position {}, run abandoned", position),
                Some(Err(e)) => {
                    warn!("Strategy for grid position {} failed: {}", position, e);
                    outcome.failures.insert(position);
                }
                Some(Ok(decoded)) => {
                    outcome.rejected += decoded.rejected;
                    if decoded.records.is_empty() && decoded.rejected > 0 {
                        warn!(
                            "Strategy for grid position {}: all {} rows rejected",
                            position, decoded.rejected
                        );
                        outcome.failures.insert(position);
                    }
                    outcome.records.extend(decoded.records);
                }
            }
        }
        outcome
    })
    .await
}

async fn sweep_position(
    invoker: &SimulationInvoker,
    track: TrackId,
    conditions: &RaceConditions,
    position: u8,
) -> Result<crate::prediction::Decoded, PitwallError> {
    let kind = strategy_kind(position);
    let raw = invoker
        .call(
            kind.module(),
            ENTRY_POINT,
            strategy_args(track, position, conditions),
        )
        .await?;
    if let Some(message) = raw.reported_message(kind) {
        return Err(PitwallError::ModuleReported {
            module: kind.module().to_string(),
            message,
        });
    }
    Ok(decode(&raw, kind))
}
