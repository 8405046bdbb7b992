use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::{CampaignStatus, SaleStatus};
use crate::db::models::lead::{Lead, LeadFilter};
use crate::db::store::{CampaignStore, LeadStore};
use crate::error::AppResult;
use crate::services::context::RequestContext;

/// Disposition counts over a set of leads. `conversion_rate` is `closed / total`,
/// and zero for an empty set.
#[derive(Serialize, Default, Clone, Debug, PartialEq)]
pub struct KpiSummary {
    pub total: i64,
    pub closed: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub not_interested: i64,
    pub no_response: i64,
    pub approved: i64,
    pub pending_approval: i64,
    pub conversion_rate: f64,
}

impl KpiSummary {
    pub fn from_leads<'a>(leads: impl IntoIterator<Item = &'a Lead>) -> Self {
        let mut summary = Self::default();
        for lead in leads {
            summary.record(lead);
        }
        summary.finish();
        summary
    }

    fn record(&mut self, lead: &Lead) {
        self.total += 1;
        match lead.sale_status {
            SaleStatus::Pending => self.pending += 1,
            SaleStatus::Closed => self.closed += 1,
            SaleStatus::NotInterested => self.not_interested += 1,
            SaleStatus::Confirmed => self.confirmed += 1,
            SaleStatus::NoResponse => self.no_response += 1,
        }
        if lead.admin_approved {
            self.approved += 1;
        }
        if lead.is_pending_approval() {
            self.pending_approval += 1;
        }
    }

    fn finish(&mut self) {
        self.conversion_rate = if self.total == 0 {
            0.0
        } else {
            self.closed as f64 / self.total as f64
        };
    }
}

#[derive(Deserialize, Default, Clone, Debug)]
pub struct KpiQuery {
    pub campaign_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl KpiQuery {
    fn to_filter(&self) -> LeadFilter {
        LeadFilter {
            campaign_id: self.campaign_id,
            assigned_to: self.user_id,
            assigned_date: self.date,
            start_date: self.start_date,
            end_date: self.end_date,
            ..Default::default()
        }
    }
}

/// One row of the team-performance table.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TeamPerformanceRow {
    pub user_id: Uuid,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub kpis: KpiSummary,
}

/// Dashboard card for one campaign.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CampaignCard {
    pub campaign_id: Uuid,
    pub name: String,
    pub status: CampaignStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_lead_quota: i32,
    pub active_assignees: usize,
    #[serde(flatten)]
    pub kpis: KpiSummary,
}

pub struct KpiService;

impl KpiService {
    /// Agents are always scoped to their own leads, whatever user they ask for.
    pub fn compute<S: LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        query: &KpiQuery,
    ) -> AppResult<KpiSummary> {
        let mut filter = query.to_filter();
        if !ctx.is_admin() {
            filter.assigned_to = Some(ctx.user_id);
        }
        let leads = store.list_leads(&filter)?;
        Ok(KpiSummary::from_leads(&leads))
    }

    /// Per (user, date) rows, ordered by date then user.
    pub fn team_performance<S: LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        query: &KpiQuery,
    ) -> AppResult<Vec<TeamPerformanceRow>> {
        let mut filter = query.to_filter();
        if !ctx.is_admin() {
            filter.assigned_to = Some(ctx.user_id);
        }
        let leads = store.list_leads(&filter)?;

        let mut groups: BTreeMap<(NaiveDate, Uuid), Vec<&Lead>> = BTreeMap::new();
        for lead in &leads {
            groups
                .entry((lead.assigned_date, lead.assigned_to))
                .or_default()
                .push(lead);
        }
        Ok(groups
            .into_iter()
            .map(|((date, user_id), group)| TeamPerformanceRow {
                user_id,
                date,
                kpis: KpiSummary::from_leads(group),
            })
            .collect())
    }

    pub fn campaign_cards<S: CampaignStore + LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        status: Option<CampaignStatus>,
    ) -> AppResult<Vec<CampaignCard>> {
        ctx.require_admin()?;
        let campaigns = store.list_campaigns(status)?;

        let mut cards = Vec::with_capacity(campaigns.len());
        for campaign in campaigns {
            let leads = store.list_leads(&LeadFilter {
                campaign_id: Some(campaign.id),
                ..Default::default()
            })?;
            let active_assignees = store.list_assignments(campaign.id, true)?.len();
            cards.push(CampaignCard {
                campaign_id: campaign.id,
                name: campaign.name,
                status: campaign.status,
                start_date: campaign.start_date,
                end_date: campaign.end_date,
                daily_lead_quota: campaign.daily_lead_quota,
                active_assignees,
                kpis: KpiSummary::from_leads(&leads),
            });
        }
        Ok(cards)
    }
}
