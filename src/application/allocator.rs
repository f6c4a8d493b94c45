//! Placement assignment and budget-constrained activation.
//!
//! `assign` turns a ranking into draft placements. `activate` promotes draft
//! and completed placements into the live pipeline while the campaign's
//! pending escrows cover their estimated cost, all in one atomic unit.
//! Content is posted afterwards by `publish_activated`, outside any database
//! transaction; a failed post only reverts that placement's status.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use diesel::{Connection, SqliteConnection};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::lock::CampaignLocks;
use super::matcher::{estimate_cost, RankedChannel};
use crate::adapter::outbound::sqlite::campaign::{
    active_ads, get_ad, get_campaign, set_campaign_status, set_start_date,
};
use crate::adapter::outbound::sqlite::channel::get_channel;
use crate::adapter::outbound::sqlite::ledger::{assign_creator, pending_escrows};
use crate::adapter::outbound::sqlite::match_log;
use crate::adapter::outbound::sqlite::placement::{
    by_campaign, find_by_pair, get_placement, insert_placement, save_placement,
};
use crate::adapter::outbound::sqlite::Database;
use crate::domain::campaign::{Ad, Campaign, CampaignStatus, Schedule};
use crate::domain::channel::Channel;
use crate::domain::id::{CampaignId, ChannelId, EscrowId, PlacementId};
use crate::domain::match_log::{MatchLog, MatchStage};
use crate::domain::money::{format_money, Money};
use crate::domain::objective::{ScoreInputs, WeightProfile};
use crate::domain::placement::{FollowUp, Placement, PlacementStatus, TransitionOrigin};
use crate::error::{DeliveryError, Result};
use crate::infrastructure::config::matching::MatchingConfig;
use crate::port::{DeleteRequest, Delivery, DeliveryAction, Event, Notifier, PostRequest};

/// Smallest CPM used when estimating activation cost.
const MIN_ESTIMATE_CPM: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// A placement created or found in draft by [`PlacementAllocator::assign`].
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub placement: PlacementId,
    pub channel_title: String,
    pub score: f64,
    pub created: bool,
}

/// A channel whose processing failed; the rest of the batch continued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub channel: ChannelId,
    pub reason: String,
}

/// Result of [`PlacementAllocator::assign`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignReport {
    pub assigned: Vec<Assignment>,
    pub failures: Vec<ItemFailure>,
}

/// Why an activation pass did or did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Completed,
    NoActiveAds,
    /// End date passed; the campaign was marked completed.
    Expired,
    /// Start date in the future; the campaign was marked scheduled.
    NotStarted,
    NoPendingEscrow,
    /// Pending escrows do not exceed the minimum fund.
    InsufficientFunds { available: Money },
}

/// A placement promoted by activation.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub placement: PlacementId,
    pub channel_title: String,
    /// `approved` for auto-publishing channels, `pending` otherwise.
    pub status: PlacementStatus,
    pub score: f64,
    pub cost: Money,
}

/// Result of [`PlacementAllocator::activate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationReport {
    pub campaign: CampaignId,
    pub outcome: ActivationOutcome,
    pub activated: Vec<Activation>,
    /// Titles of channels whose estimated cost exceeded the remaining budget.
    pub skipped_for_budget: Vec<String>,
    pub failures: Vec<ItemFailure>,
    /// Escrowed budget left after the reservations of this pass.
    pub budget_remaining: Money,
}

impl ActivationReport {
    fn short_circuit(campaign: &CampaignId, outcome: ActivationOutcome) -> Self {
        Self {
            campaign: campaign.clone(),
            outcome,
            activated: Vec::new(),
            skipped_for_budget: Vec::new(),
            failures: Vec::new(),
            budget_remaining: Decimal::ZERO,
        }
    }
}

/// Result of [`PlacementAllocator::publish_activated`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub published: Vec<PlacementId>,
    /// Placements that did not go live; a failed post reverts to `pending`.
    pub reverted: Vec<PlacementId>,
}

/// Result of [`PlacementAllocator::run_activation`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRun {
    pub activation: ActivationReport,
    pub publish: PublishReport,
}

/// Result of [`PlacementAllocator::repost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepostOutcome {
    /// New content reference.
    Reposted(String),
    /// Not running, or out of reposts.
    NotEligible,
    /// The new post failed; the placement is unchanged.
    Failed,
}

struct Candidate {
    channel: Channel,
    score: f64,
    engagement: f64,
    cost: Money,
}

/// Estimated cost of activating `channel` for `campaign`, priced at the
/// campaign's CPM.
#[must_use]
pub fn activation_cost(campaign: &Campaign, channel: &Channel, engagement_rate: f64) -> Money {
    estimate_cost(
        channel.subscribers.max(1),
        engagement_rate,
        campaign.cpm.max(MIN_ESTIMATE_CPM),
    )
}

/// Assigns and activates placements.
pub struct PlacementAllocator {
    db: Database,
    config: MatchingConfig,
    delivery: Arc<dyn Delivery>,
    notifier: Arc<dyn Notifier>,
    locks: CampaignLocks,
}

impl PlacementAllocator {
    #[must_use]
    pub fn new(
        db: Database,
        config: MatchingConfig,
        delivery: Arc<dyn Delivery>,
        notifier: Arc<dyn Notifier>,
        locks: CampaignLocks,
    ) -> Self {
        Self {
            db,
            config,
            delivery,
            notifier,
            locks,
        }
    }

    /// Get or create a draft placement for every active ad and ranked
    /// channel.
    ///
    /// Pairs whose placement is live or paused are left alone. A failure on
    /// one pair is recorded and the rest continue.
    ///
    /// # Errors
    /// Returns an error only if the campaign or its ads cannot be loaded.
    pub fn assign(&self, campaign: &CampaignId, ranked: &[RankedChannel]) -> Result<AssignReport> {
        let mut conn = self.db.connection()?;
        let campaign = get_campaign(&mut conn, campaign)?;
        let ads = active_ads(&mut conn, &campaign.id)?;
        drop(conn);

        let mut report = AssignReport::default();
        if ads.is_empty() {
            warn!(campaign_id = %campaign.id, "No active ads to assign");
            return Ok(report);
        }

        for ad in &ads {
            for entry in ranked {
                match self
                    .db
                    .atomic(|conn| self.assign_pair(conn, &campaign, ad, entry))
                {
                    Ok(Some(assignment)) => report.assigned.push(assignment),
                    Ok(None) => {}
                    Err(e) => {
                        error!(
                            campaign_id = %campaign.id,
                            channel_id = %entry.channel.id,
                            error = %e,
                            "Assignment failed"
                        );
                        report.failures.push(ItemFailure {
                            channel: entry.channel.id.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        if report.assigned.is_empty() {
            error!(
                campaign_id = %campaign.id,
                channels_tried = ranked.len(),
                "No placements assigned"
            );
        } else {
            info!(
                campaign_id = %campaign.id,
                assigned = report.assigned.len(),
                failures = report.failures.len(),
                "Placements assigned"
            );
        }
        Ok(report)
    }

    fn assign_pair(
        &self,
        conn: &mut SqliteConnection,
        campaign: &Campaign,
        ad: &Ad,
        entry: &RankedChannel,
    ) -> Result<Option<Assignment>> {
        let channel = &entry.channel;
        if let Some(existing) = find_by_pair(conn, &ad.id, &channel.id)? {
            if !existing.status.is_reassignable() {
                return Ok(None);
            }
            info!(
                campaign_id = %campaign.id,
                placement_id = %existing.id,
                "Found existing placement awaiting activation"
            );
            return Ok(Some(Assignment {
                placement: existing.id,
                channel_title: channel.title.clone(),
                score: entry.score,
                created: false,
            }));
        }

        let placement = Placement {
            id: PlacementId::new(),
            ad_id: ad.id.clone(),
            channel_id: channel.id.clone(),
            campaign_id: campaign.id.clone(),
            status: PlacementStatus::Draft,
            preference_score: entry.score,
            winning_bid_price: channel.min_cpm,
            content_platform_id: None,
            repost_count: 0,
            max_reposts: channel.repost_preference,
        };
        insert_placement(conn, &placement)?;

        let cost = activation_cost(
            campaign,
            channel,
            channel.engagement_rate(self.config.fallback_engagement),
        );
        match_log::append(
            conn,
            &MatchLog {
                campaign_id: campaign.id.clone(),
                placement_id: placement.id.clone(),
                stage: MatchStage::InitialMatch,
                reason: format!(
                    "{} Channel: {} | Score: {:.2} | Estimated Cost: {} | Campaign Budget: {} | \
                     Subscribers: {} | Min CPM: {} | Objective: {}",
                    MatchStage::InitialMatch.label(),
                    channel.title,
                    entry.score,
                    format_money(cost),
                    format_money(campaign.initial_budget),
                    channel.subscribers,
                    format_money(channel.min_cpm),
                    campaign.objective,
                ),
                estimated_cost: cost,
                created_at: Utc::now(),
            },
        )?;
        info!(
            campaign_id = %campaign.id,
            placement_id = %placement.id,
            channel = %channel.title,
            "Placement created"
        );
        Ok(Some(Assignment {
            placement: placement.id,
            channel_title: channel.title.clone(),
            score: entry.score,
            created: true,
        }))
    }

    /// Promote draft and completed placements under the escrowed budget.
    ///
    /// Runs as one atomic unit. Callers serialize it against metering for
    /// the same campaign; [`run_activation`](Self::run_activation) does so.
    ///
    /// # Errors
    /// Returns an error if the campaign cannot be loaded or the unit cannot
    /// commit. Per-placement failures are recorded in the report.
    pub fn activate(&self, campaign: &CampaignId, today: NaiveDate) -> Result<ActivationReport> {
        let (report, follow_ups) = self
            .db
            .atomic(|conn| self.activate_in(conn, campaign, today))?;
        self.dispatch(follow_ups);

        if !report.skipped_for_budget.is_empty() {
            warn!(
                campaign_id = %campaign,
                skipped = ?report.skipped_for_budget,
                "Skipped channels over remaining budget"
            );
        }
        Ok(report)
    }

    fn activate_in(
        &self,
        conn: &mut SqliteConnection,
        campaign_id: &CampaignId,
        today: NaiveDate,
    ) -> Result<(ActivationReport, Vec<FollowUp>)> {
        let campaign = get_campaign(conn, campaign_id)?;
        let ads = active_ads(conn, campaign_id)?;
        if ads.is_empty() {
            warn!(campaign_id = %campaign_id, "No active ads");
            return Ok((
                ActivationReport::short_circuit(campaign_id, ActivationOutcome::NoActiveAds),
                Vec::new(),
            ));
        }

        match campaign.schedule(today) {
            Schedule::Expired => {
                set_campaign_status(conn, campaign_id, CampaignStatus::Completed)?;
                warn!(campaign_id = %campaign_id, "Campaign has expired");
                return Ok((
                    ActivationReport::short_circuit(campaign_id, ActivationOutcome::Expired),
                    Vec::new(),
                ));
            }
            Schedule::NotStarted => {
                set_campaign_status(conn, campaign_id, CampaignStatus::Scheduled)?;
                warn!(campaign_id = %campaign_id, "Campaign is not yet active");
                return Ok((
                    ActivationReport::short_circuit(campaign_id, ActivationOutcome::NotStarted),
                    Vec::new(),
                ));
            }
            Schedule::Running => {}
        }

        let escrows = pending_escrows(conn, campaign_id)?;
        let Some(escrow) = escrows.first() else {
            warn!(campaign_id = %campaign_id, "No pending escrows");
            return Ok((
                ActivationReport::short_circuit(campaign_id, ActivationOutcome::NoPendingEscrow),
                Vec::new(),
            ));
        };
        let mut budget: Money = escrows.iter().map(|e| e.remaining_amount).sum();
        if budget <= self.config.minimum_fund {
            warn!(
                campaign_id = %campaign_id,
                remaining = %budget,
                minimum = %self.config.minimum_fund,
                "Insufficient escrowed funds"
            );
            return Ok((
                ActivationReport::short_circuit(
                    campaign_id,
                    ActivationOutcome::InsufficientFunds { available: budget },
                ),
                Vec::new(),
            ));
        }

        let mut report = ActivationReport::short_circuit(campaign_id, ActivationOutcome::Completed);
        let candidates = self.candidates(conn, &campaign, &mut report)?;
        let profile = WeightProfile::for_objective(campaign.objective);
        let mut follow_ups = Vec::new();

        for ad in &ads {
            let mut count = 0;
            for candidate in &candidates {
                if count >= profile.max_channels {
                    break;
                }
                if candidate.cost > budget {
                    report.skipped_for_budget.push(candidate.channel.title.clone());
                    continue;
                }
                // Savepoint per pair, so a failed pair leaves no partial writes.
                let activated = conn.transaction(|pair| {
                    self.activate_pair(pair, &campaign, ad, candidate, &escrow.id, budget)
                });
                match activated {
                    Ok(Some((activation, mut effects))) => {
                        budget -= activation.cost;
                        follow_ups.append(&mut effects);
                        report.activated.push(activation);
                        count += 1;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(
                            campaign_id = %campaign_id,
                            channel_id = %candidate.channel.id,
                            error = %e,
                            "Activation failed"
                        );
                        report.failures.push(ItemFailure {
                            channel: candidate.channel.id.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        report.budget_remaining = budget;
        info!(
            campaign_id = %campaign_id,
            activated = report.activated.len(),
            budget_remaining = %budget,
            "Activation pass finished"
        );
        Ok((report, follow_ups))
    }

    /// Rescored channels of draft and completed placements, best first,
    /// one entry per channel.
    fn candidates(
        &self,
        conn: &mut SqliteConnection,
        campaign: &Campaign,
        report: &mut ActivationReport,
    ) -> Result<Vec<Candidate>> {
        let profile = WeightProfile::for_objective(campaign.objective);
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for placement in by_campaign(conn, &campaign.id, &PlacementStatus::REASSIGNABLE)? {
            if !seen.insert(placement.channel_id.clone()) {
                continue;
            }
            let channel = match get_channel(conn, &placement.channel_id) {
                Ok(channel) => channel,
                Err(e) => {
                    report.failures.push(ItemFailure {
                        channel: placement.channel_id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if !channel.is_listed() || channel.min_cpm > campaign.cpm {
                continue;
            }

            let engagement = channel.engagement_rate(self.config.fallback_engagement);
            let score = profile.score(&ScoreInputs {
                match_score: placement.preference_score,
                subscribers: channel.subscribers,
                rating: channel.rating(),
                fraud_score: channel.fraud_score(),
                engagement_rate: engagement,
                auto_publish: channel.auto_publish,
            });
            let cost = activation_cost(campaign, &channel, engagement);
            candidates.push(Candidate {
                channel,
                score,
                engagement,
                cost,
            });
        }

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(candidates)
    }

    fn activate_pair(
        &self,
        conn: &mut SqliteConnection,
        campaign: &Campaign,
        ad: &Ad,
        candidate: &Candidate,
        escrow: &EscrowId,
        budget: Money,
    ) -> Result<Option<(Activation, Vec<FollowUp>)>> {
        let channel = &candidate.channel;
        let mut placement = match find_by_pair(conn, &ad.id, &channel.id)? {
            Some(existing) if !existing.status.is_reassignable() => return Ok(None),
            Some(existing) => existing,
            None => {
                let placement = Placement {
                    id: PlacementId::new(),
                    ad_id: ad.id.clone(),
                    channel_id: channel.id.clone(),
                    campaign_id: campaign.id.clone(),
                    status: PlacementStatus::Draft,
                    preference_score: candidate.score,
                    winning_bid_price: channel.min_cpm,
                    content_platform_id: None,
                    repost_count: 0,
                    max_reposts: channel.repost_preference,
                };
                insert_placement(conn, &placement)?;
                placement
            }
        };

        let target = if channel.auto_publish {
            PlacementStatus::Approved
        } else {
            PlacementStatus::Pending
        };
        let follow_ups = placement.transition(target, TransitionOrigin::Batch)?;
        placement.preference_score = candidate.score;
        placement.max_reposts = channel.repost_preference;
        placement.winning_bid_price = channel.min_cpm;
        save_placement(conn, &placement)?;
        assign_creator(conn, escrow, &channel.owner)?;

        let after = budget - candidate.cost;
        match_log::append(
            conn,
            &MatchLog {
                campaign_id: campaign.id.clone(),
                placement_id: placement.id.clone(),
                stage: MatchStage::Activated,
                reason: format!(
                    "{} Channel: {} | Score: {:.2} | Engagement Rate: {:.2}% | Estimated Cost: {} | \
                     Remaining Budget: {} -> {} | Subscribers: {} | Min CPM: {} | Objective: {}",
                    MatchStage::Activated.label(),
                    channel.title,
                    candidate.score,
                    candidate.engagement * 100.0,
                    format_money(candidate.cost),
                    format_money(budget),
                    format_money(after),
                    channel.subscribers,
                    format_money(channel.min_cpm),
                    campaign.objective,
                ),
                estimated_cost: candidate.cost,
                created_at: Utc::now(),
            },
        )?;
        info!(
            campaign_id = %campaign.id,
            placement_id = %placement.id,
            channel = %channel.title,
            cost = %candidate.cost,
            status = %target,
            "Placement activated"
        );

        Ok(Some((
            Activation {
                placement: placement.id,
                channel_title: channel.title.clone(),
                status: target,
                score: candidate.score,
                cost: candidate.cost,
            },
            follow_ups,
        )))
    }

    /// Post every activated placement that auto-published.
    ///
    /// Never touches the budget reserved by `activate`.
    pub async fn publish_activated(&self, activated: &[Activation], today: NaiveDate) -> PublishReport {
        let mut report = PublishReport::default();
        for activation in activated {
            if activation.status != PlacementStatus::Approved {
                continue;
            }
            match self.publish(&activation.placement, today).await {
                Ok(true) => report.published.push(activation.placement.clone()),
                Ok(false) => report.reverted.push(activation.placement.clone()),
                Err(e) => {
                    error!(placement_id = %activation.placement, error = %e, "Publish failed");
                    report.reverted.push(activation.placement.clone());
                }
            }
        }
        report
    }

    /// Post one approved placement. Returns `false` if delivery failed and
    /// the placement went back to `pending`.
    async fn publish(&self, id: &PlacementId, today: NaiveDate) -> Result<bool> {
        let (placement, request) = {
            let mut conn = self.db.connection()?;
            let placement = get_placement(&mut conn, id)?;
            let ad = get_ad(&mut conn, &placement.ad_id)?;
            let channel = get_channel(&mut conn, &placement.channel_id)?;
            let request = PostRequest {
                placement: placement.id.clone(),
                channel: channel.external_handle,
                headline: ad.headline,
                body: ad.body,
            };
            (placement, request)
        };
        if placement.status != PlacementStatus::Approved {
            warn!(placement_id = %id, status = %placement.status, "Skipping publish");
            return Ok(false);
        }

        match self.delivery.post(&request).await {
            Ok(content_ref) => {
                let follow_ups = self.db.atomic(|conn| {
                    let mut placement = get_placement(conn, id)?;
                    placement.content_platform_id = Some(content_ref.clone());
                    let follow_ups = placement.transition(PlacementStatus::Running, TransitionOrigin::Batch)?;
                    save_placement(conn, &placement)?;
                    set_start_date(conn, &placement.campaign_id, today)?;
                    Ok(follow_ups)
                })?;
                self.dispatch(follow_ups);
                info!(placement_id = %id, content_ref = %content_ref, "Placement published");
                Ok(true)
            }
            Err(e) => {
                error!(placement_id = %id, error = %e, "Post failed; reverting to pending");
                self.revert_to_pending(id)?;
                self.notifier.notify(Event::DeliveryFailed {
                    placement: id.clone(),
                    action: DeliveryAction::Post,
                    reason: e.to_string(),
                });
                Ok(false)
            }
        }
    }

    fn revert_to_pending(&self, id: &PlacementId) -> Result<()> {
        let follow_ups = self.db.atomic(|conn| {
            let mut placement = get_placement(conn, id)?;
            let follow_ups = placement.transition(PlacementStatus::Pending, TransitionOrigin::Batch)?;
            save_placement(conn, &placement)?;
            Ok(follow_ups)
        })?;
        self.dispatch(follow_ups);
        Ok(())
    }

    /// Creator approval of a pending placement.
    ///
    /// Content is posted only while the campaign is active. Returns whether
    /// the placement went live.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidPlacementTransition`](crate::domain::error::DomainError)
    /// if the placement cannot be approved from its current status.
    pub async fn approve_placement(&self, id: &PlacementId, today: NaiveDate) -> Result<bool> {
        let (follow_ups, campaign_status) = self.db.atomic(|conn| {
            let mut placement = get_placement(conn, id)?;
            let follow_ups = placement.transition(PlacementStatus::Approved, TransitionOrigin::Single)?;
            save_placement(conn, &placement)?;
            let campaign = get_campaign(conn, &placement.campaign_id)?;
            Ok((follow_ups, campaign.status))
        })?;

        let mut live = false;
        for follow_up in follow_ups {
            match follow_up {
                FollowUp::Publish(placement) => {
                    if campaign_status == CampaignStatus::Active {
                        live = self.publish(&placement, today).await?;
                    } else {
                        info!(
                            placement_id = %placement,
                            campaign_status = %campaign_status,
                            "Approved; campaign not active, publish deferred"
                        );
                    }
                }
                notify @ FollowUp::NotifyOwner { .. } => self.dispatch(vec![notify]),
            }
        }
        Ok(live)
    }

    /// Delete and re-post a running placement's content.
    ///
    /// A failed delete is reported but does not block the new post.
    ///
    /// # Errors
    /// Returns an error if the placement cannot be loaded or saved.
    pub async fn repost(&self, id: &PlacementId) -> Result<RepostOutcome> {
        let (placement, channel, ad) = {
            let mut conn = self.db.connection()?;
            let placement = get_placement(&mut conn, id)?;
            let channel = get_channel(&mut conn, &placement.channel_id)?;
            let ad = get_ad(&mut conn, &placement.ad_id)?;
            (placement, channel, ad)
        };
        if !placement.can_repost() {
            info!(
                placement_id = %id,
                status = %placement.status,
                reposts = placement.repost_count,
                "Placement not eligible for repost"
            );
            return Ok(RepostOutcome::NotEligible);
        }

        let deleted = match &placement.content_platform_id {
            Some(content_ref) => {
                self.delivery
                    .delete(&DeleteRequest {
                        placement: id.clone(),
                        channel: channel.external_handle.clone(),
                        content_ref: content_ref.clone(),
                    })
                    .await
            }
            None => Err(DeliveryError::MissingContentRef(id.to_string())),
        };
        if let Err(e) = deleted {
            warn!(placement_id = %id, error = %e, "Delete before repost failed");
            self.notifier.notify(Event::DeliveryFailed {
                placement: id.clone(),
                action: DeliveryAction::Delete,
                reason: e.to_string(),
            });
        }

        let request = PostRequest {
            placement: id.clone(),
            channel: channel.external_handle,
            headline: ad.headline,
            body: ad.body,
        };
        match self.delivery.post(&request).await {
            Ok(content_ref) => {
                self.db.atomic(|conn| {
                    let mut placement = get_placement(conn, id)?;
                    placement.repost_count += 1;
                    placement.content_platform_id = Some(content_ref.clone());
                    save_placement(conn, &placement)
                })?;
                info!(placement_id = %id, content_ref = %content_ref, "Placement reposted");
                Ok(RepostOutcome::Reposted(content_ref))
            }
            Err(e) => {
                error!(placement_id = %id, error = %e, "Repost failed");
                self.notifier.notify(Event::DeliveryFailed {
                    placement: id.clone(),
                    action: DeliveryAction::Repost,
                    reason: e.to_string(),
                });
                Ok(RepostOutcome::Failed)
            }
        }
    }

    /// [`activate`](Self::activate) then
    /// [`publish_activated`](Self::publish_activated), holding the
    /// campaign lock throughout.
    ///
    /// # Errors
    /// As [`activate`](Self::activate).
    pub async fn run_activation(&self, campaign: &CampaignId, today: NaiveDate) -> Result<ActivationRun> {
        let run = {
            let _guard = self.locks.acquire(campaign).await;
            let activation = self.activate(campaign, today)?;
            let publish = self.publish_activated(&activation.activated, today).await;
            ActivationRun {
                activation,
                publish,
            }
        };
        self.locks.prune();
        Ok(run)
    }

    fn dispatch(&self, follow_ups: Vec<FollowUp>) {
        for follow_up in follow_ups {
            match follow_up {
                FollowUp::NotifyOwner { placement, status } => {
                    self.notifier
                        .notify(Event::PlacementStatusChanged { placement, status });
                }
                FollowUp::Publish(placement) => {
                    warn!(placement_id = %placement, "Unexpected publish follow-up in batch path");
                }
            }
        }
    }
}
