//! SIR Tracker: discovers outstanding spot instance requests for an
//! ASG, classifies each against the dispatch table in SPEC_FULL.md
//! §4.5, and either advances or finalizes it. Finalization is durable:
//! it is recorded as the `autospotting-complete=true` tag on the SIR
//! itself, never in process memory.

use crate::catalog::InstanceCatalog;
use crate::cloud::{SpotRequester, Waiter};
use crate::error::{Error, Result};
use crate::tags;
use crate::types::{SirState, SirStatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A spot instance request as reported by the cloud API.
#[derive(Debug, Clone)]
pub struct SpotInstanceRequest {
    pub id: String,
    pub state: SirState,
    pub status: SirStatusCode,
    pub fulfilled_instance_id: Option<String>,
    pub tags: HashMap<String, String>,
}

impl SpotInstanceRequest {
    pub fn is_complete(&self) -> bool {
        tags::is_complete(&self.tags)
    }
}

/// What the SIR tracker decided to do with one SIR this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SirOutcome {
    /// A fulfilled SIR whose instance needs to be swapped into the ASG.
    ReadyForSwap { sir_id: String, instance_id: String },
    /// Nothing to attach; caller should look at the next outstanding SIR.
    TryNext,
    /// A bounded wait is in flight; caller should stop and retry next tick.
    WaitForNextTick,
}

/// Discover SIRs tagged `launched-for-asg=<asg_name>`, dropping
/// already-finalized and dead-cancelled ones, per §4.5 "Discovery".
fn discover(all: Vec<SpotInstanceRequest>, asg_name: &str) -> Vec<SpotInstanceRequest> {
    all.into_iter()
        .filter(|sir| tags::launched_for(&sir.tags) == Some(asg_name))
        .filter(|sir| !sir.is_complete())
        .filter(|sir| {
            !(sir.state == SirState::Cancelled && sir.fulfilled_instance_id.is_none())
        })
        .collect()
}

pub struct SirTracker<'a, R: SpotRequester, W: Waiter> {
    requester: &'a R,
    waiter: &'a W,
}

impl<'a, R: SpotRequester, W: Waiter> SirTracker<'a, R, W> {
    pub fn new(requester: &'a R, waiter: &'a W) -> Self {
        Self { requester, waiter }
    }

    /// Fetch and discover all live SIRs for `asg_name`.
    pub async fn outstanding(&self, asg_name: &str) -> Result<Vec<SpotInstanceRequest>> {
        let all = self.requester.describe_sirs_for_asg(asg_name).await?;
        Ok(discover(all, asg_name))
    }

    /// Mark a SIR durably complete; idempotent.
    pub async fn finalize(&self, sir_id: &str) -> Result<()> {
        self.requester
            .tag_sir(sir_id, tags::AUTOSPOTTING_COMPLETE, "true")
            .await
    }

    fn instance_running_in_asg(catalog: &InstanceCatalog, asg_instance_ids: &[String], instance_id: &str) -> bool {
        asg_instance_ids.iter().any(|id| id == instance_id)
            && catalog.get(instance_id).map(|i| i.is_running()).unwrap_or(false)
    }

    fn instance_alive(catalog: &InstanceCatalog, instance_id: &str) -> bool {
        catalog
            .get(instance_id)
            .map(|i| !i.state.is_terminal())
            .unwrap_or(false)
    }

    /// Dispatch one SIR per the table in §4.5. `deadline` bounds the
    /// wait for fulfilment; `asg_instance_ids` is the ASG's live
    /// membership list used to decide "in ASG" vs. "orphaned".
    pub async fn dispatch(
        &self,
        sir: SpotInstanceRequest,
        catalog: &InstanceCatalog,
        asg_instance_ids: &[String],
        deadline: Duration,
    ) -> Result<SirOutcome> {
        // `open` and "fulfilled but not yet running" both resolve by
        // waiting and then re-classifying the refreshed SIR; looping
        // here (rather than recursing) keeps the future's size finite.
        let mut sir = sir;
        loop {
            match sir.state {
                SirState::Active => match sir.status {
                    SirStatusCode::Fulfilled => {
                        let Some(instance_id) = sir.fulfilled_instance_id.clone() else {
                            match self.wait_once(&sir.id, deadline).await? {
                                Some(refreshed) => {
                                    sir = refreshed;
                                    continue;
                                }
                                None => return Ok(SirOutcome::WaitForNextTick),
                            }
                        };
                        if Self::instance_running_in_asg(catalog, asg_instance_ids, &instance_id) {
                            info!(sir_id = %sir.id, "spot instance already attached, finalizing SIR");
                            self.finalize(&sir.id).await?;
                            return Ok(SirOutcome::TryNext);
                        } else if catalog.get(&instance_id).map(|i| i.is_running()).unwrap_or(false) {
                            info!(sir_id = %sir.id, instance_id = %instance_id, "fulfilled spot instance found running outside ASG");
                            return Ok(SirOutcome::ReadyForSwap { sir_id: sir.id.clone(), instance_id });
                        } else {
                            match self.wait_once(&sir.id, deadline).await? {
                                Some(refreshed) => {
                                    sir = refreshed;
                                    continue;
                                }
                                None => return Ok(SirOutcome::WaitForNextTick),
                            }
                        }
                    }
                    SirStatusCode::Other => {
                        debug!(sir_id = %sir.id, "active SIR with non-fulfilled status, finalizing");
                        self.finalize(&sir.id).await?;
                        return Ok(SirOutcome::TryNext);
                    }
                },
                SirState::Open => {
                    info!(sir_id = %sir.id, "waiting for open SIR to be fulfilled");
                    match self.wait_once(&sir.id, deadline).await? {
                        Some(refreshed) => {
                            sir = refreshed;
                            continue;
                        }
                        None => return Ok(SirOutcome::WaitForNextTick),
                    }
                }
                SirState::Cancelled => {
                    let Some(instance_id) = sir.fulfilled_instance_id.clone() else {
                        self.finalize(&sir.id).await?;
                        return Ok(SirOutcome::TryNext);
                    };
                    return if !Self::instance_alive(catalog, &instance_id) {
                        self.finalize(&sir.id).await?;
                        Ok(SirOutcome::TryNext)
                    } else if Self::instance_running_in_asg(catalog, asg_instance_ids, &instance_id) {
                        // Already attached somehow; nothing left to do.
                        self.finalize(&sir.id).await?;
                        Ok(SirOutcome::TryNext)
                    } else {
                        Ok(SirOutcome::ReadyForSwap { sir_id: sir.id.clone(), instance_id })
                    };
                }
                SirState::Closed | SirState::Failed => {
                    warn!(sir_id = %sir.id, state = ?sir.state, "terminal SIR, finalizing");
                    self.finalize(&sir.id).await?;
                    return Ok(SirOutcome::TryNext);
                }
            }
        }
    }

    /// Wait once for fulfilment; `Ok(None)` means the deadline was hit
    /// and the caller should abort this tick's work on the SIR.
    async fn wait_once(
        &self,
        sir_id: &str,
        deadline: Duration,
    ) -> Result<Option<SpotInstanceRequest>> {
        match self.waiter.wait_until_fulfilled(sir_id, deadline).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(Error::DeadlineExceeded(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Walk the outstanding SIRs for an ASG, dispatching each in turn.
    /// At most one `ReadyForSwap` is returned per tick; the rest are
    /// left for subsequent ticks, per the "at most one SIR may match"
    /// rule in §4.5.
    pub async fn find_match(
        &self,
        asg_name: &str,
        catalog: &InstanceCatalog,
        asg_instance_ids: &[String],
        deadline: Duration,
    ) -> Result<Option<SirOutcome>> {
        for sir in self.outstanding(asg_name).await? {
            match self.dispatch(sir, catalog, asg_instance_ids, deadline).await? {
                SirOutcome::TryNext => continue,
                other => return Ok(Some(other)),
            }
        }
        Ok(None)
    }
}
