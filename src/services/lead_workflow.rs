use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::db::enums::SaleStatus;
use crate::db::models::api::error_codes;
use crate::db::models::lead::{Lead, LeadChangeset, LeadFilter};
use crate::db::store::{EngineStore, Isolation, LeadStore, UnitOfWork, run_atomic};
use crate::error::{AppError, AppResult};
use crate::routes::leads::UpdateLeadRequest;
use crate::services::context::RequestContext;
use crate::services::lead_sources::LeadSourceRegistry;
use crate::validation::lead::{
    UpdateLeadChanges, validate_bulk_ids, validate_lead_contacts, validate_update_lead,
};

/// Admin decision on a closed lead.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approve,
    Reject,
    Revoke,
}

impl ApprovalAction {
    pub fn from_flag(approved: bool) -> Self {
        if approved {
            ApprovalAction::Approve
        } else {
            ApprovalAction::Reject
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            ApprovalAction::Approve => "approved",
            ApprovalAction::Reject => "rejected",
            ApprovalAction::Revoke => "approval revoked",
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LeadUpdateOutcome {
    pub lead: Lead,
    /// Set when the update moved a lead out of `closed` and cleared its approval.
    pub approval_reset: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ApprovalOutcome {
    pub action: ApprovalAction,
    pub lead: Lead,
    /// False when the lead already was in the requested state.
    pub changed: bool,
}

impl ApprovalOutcome {
    pub fn message(&self) -> String {
        match (self.action, self.changed) {
            (ApprovalAction::Approve, false) => {
                format!("Lead {} was already approved", self.lead.lead_number)
            }
            (action, _) => format!("Lead {} {}", self.lead.lead_number, action.past_tense()),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BulkItemResult {
    pub lead_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BulkApprovalResult {
    pub action: ApprovalAction,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
}

impl BulkApprovalResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn message(&self) -> String {
        format!(
            "{} of {} leads {}",
            self.succeeded,
            self.succeeded + self.failed,
            self.action.past_tense()
        )
    }
}

pub struct LeadWorkflow;

impl LeadWorkflow {
    /// Agents only see leads assigned to them; admins see everything.
    pub fn get_lead<S: LeadStore>(store: &mut S, ctx: &RequestContext, lead_id: Uuid) -> AppResult<Lead> {
        let lead = store.find_lead(lead_id)?.ok_or_else(lead_not_found)?;
        ensure_can_access(ctx, &lead)?;
        Ok(lead)
    }

    pub fn update_lead<S: EngineStore>(
        store: &mut S,
        ctx: &RequestContext,
        registry: &LeadSourceRegistry,
        lead_id: Uuid,
        req: &UpdateLeadRequest,
    ) -> AppResult<LeadUpdateOutcome> {
        let changes = UpdateLeadChanges {
            customer_name: req.customer_name.as_deref(),
            contact_number: req.contact_number.as_deref(),
            whatsapp_number: req.whatsapp_number.as_deref(),
            lead_source: req.lead_source.as_deref(),
            sale_status: req.sale_status,
            follow_up_status: req.follow_up_status,
            reason_not_closed: req.reason_not_closed.as_deref(),
            notes: req.notes.as_deref(),
        };
        validate_update_lead(&changes)?;

        let outcome = run_atomic(store, Isolation::ReadCommitted, |s| {
            let lead = s.lock_lead(lead_id)?.ok_or_else(lead_not_found)?;
            ensure_can_access(ctx, &lead)?;

            let now = Utc::now();
            let mut changeset = LeadChangeset {
                customer_name: req.customer_name.as_deref().map(blank_to_none),
                contact_number: req.contact_number.as_deref().map(blank_to_none),
                whatsapp_number: req.whatsapp_number.as_deref().map(blank_to_none),
                lead_source: req
                    .lead_source
                    .as_deref()
                    .map(|v| blank_to_none(v).map(|k| k.to_lowercase())),
                sale_status: req.sale_status,
                follow_up_status: req.follow_up_status,
                reason_not_closed: req.reason_not_closed.as_deref().map(blank_to_none),
                notes: req.notes.as_deref().map(blank_to_none),
                updated_by: Some(Some(ctx.user_id)),
                updated_at: Some(now),
                ..Default::default()
            };

            let leaves_closed = req.sale_status.is_some_and(|s| s != SaleStatus::Closed);
            let approval_reset = leaves_closed && lead.admin_approved;
            if approval_reset {
                changeset.admin_approved = Some(false);
                let status = req.sale_status.unwrap_or(lead.sale_status);
                changeset.admin_notes = Some(Some(append_admin_note(
                    lead.admin_notes.as_deref(),
                    ctx.user_id,
                    &format!("approval reset, status changed to {}", status),
                )));
            }

            if changes.touches_contact_rules() {
                let mut preview = lead.clone();
                preview.apply(&changeset);
                validate_lead_contacts(&preview, registry)?;
            }

            let updated = s.update_lead(lead_id, &changeset)?;
            Ok(LeadUpdateOutcome {
                lead: updated,
                approval_reset,
            })
        })?;

        if outcome.approval_reset {
            tracing::info!(
                lead_id = %lead_id,
                sale_status = %outcome.lead.sale_status,
                "Lead left closed status, admin approval cleared"
            );
        }
        Ok(outcome)
    }

    pub fn approve<S: UnitOfWork + LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        lead_id: Uuid,
        notes: Option<&str>,
    ) -> AppResult<ApprovalOutcome> {
        Self::decide(store, ctx, lead_id, ApprovalAction::Approve, notes)
    }

    /// Rejection keeps the lead closed and records the reason in the admin notes.
    pub fn reject<S: UnitOfWork + LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        lead_id: Uuid,
        reason: Option<&str>,
    ) -> AppResult<ApprovalOutcome> {
        Self::decide(store, ctx, lead_id, ApprovalAction::Reject, reason)
    }

    pub fn revoke<S: UnitOfWork + LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        lead_id: Uuid,
        notes: Option<&str>,
    ) -> AppResult<ApprovalOutcome> {
        Self::decide(store, ctx, lead_id, ApprovalAction::Revoke, notes)
    }

    pub fn decide<S: UnitOfWork + LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        lead_id: Uuid,
        action: ApprovalAction,
        notes: Option<&str>,
    ) -> AppResult<ApprovalOutcome> {
        ctx.require_admin()?;

        let outcome = run_atomic(store, Isolation::ReadCommitted, |s| {
            let lead = s.lock_lead(lead_id)?.ok_or_else(lead_not_found)?;

            match action {
                ApprovalAction::Approve | ApprovalAction::Reject
                    if lead.sale_status != SaleStatus::Closed =>
                {
                    return Err(AppError::conflict_with_code(
                        format!(
                            "Lead {} is {}, only closed leads can be reviewed",
                            lead.lead_number, lead.sale_status
                        ),
                        Some("sale_status".to_string()),
                        error_codes::LEAD_NOT_CLOSED,
                    ));
                }
                ApprovalAction::Approve if lead.admin_approved => {
                    return Ok(ApprovalOutcome {
                        action,
                        lead,
                        changed: false,
                    });
                }
                ApprovalAction::Revoke if !lead.admin_approved => {
                    return Err(AppError::conflict_with_code(
                        format!("Lead {} is not approved", lead.lead_number),
                        Some("admin_approved".to_string()),
                        error_codes::LEAD_NOT_APPROVED,
                    ));
                }
                _ => {}
            }

            let note = match notes.map(str::trim).filter(|n| !n.is_empty()) {
                Some(n) => format!("{}: {}", action.past_tense(), n),
                None => action.past_tense().to_string(),
            };
            let changeset = LeadChangeset {
                admin_approved: Some(action == ApprovalAction::Approve),
                admin_notes: Some(Some(append_admin_note(
                    lead.admin_notes.as_deref(),
                    ctx.user_id,
                    &note,
                ))),
                updated_by: Some(Some(ctx.user_id)),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            let updated = s.update_lead(lead_id, &changeset)?;
            Ok(ApprovalOutcome {
                action,
                lead: updated,
                changed: true,
            })
        })?;

        tracing::info!(
            lead_id = %lead_id,
            action = ?action,
            changed = outcome.changed,
            admin_id = %ctx.user_id,
            "Lead review recorded"
        );
        Ok(outcome)
    }

    /// Applies one decision to each lead in its own unit of work. A failing lead is
    /// reported in the results and never rolls back the others.
    pub fn bulk_decide<S: UnitOfWork + LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        lead_ids: &[Uuid],
        action: ApprovalAction,
        notes: Option<&str>,
        max_batch: usize,
    ) -> AppResult<BulkApprovalResult> {
        ctx.require_admin()?;
        let lead_ids = validate_bulk_ids(lead_ids, max_batch)?;

        let mut results = Vec::with_capacity(lead_ids.len());
        for lead_id in lead_ids {
            let item = match Self::decide(store, ctx, lead_id, action, notes) {
                Ok(outcome) => BulkItemResult {
                    lead_id,
                    success: true,
                    message: outcome.message(),
                    lead_number: Some(outcome.lead.lead_number),
                    code: None,
                },
                Err(e) => {
                    tracing::debug!(lead_id = %lead_id, error = %e, "Bulk review item failed");
                    BulkItemResult {
                        lead_id,
                        success: false,
                        lead_number: None,
                        code: Some(e.code().to_string()),
                        message: e.public_message(),
                    }
                }
            };
            results.push(item);
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        let result = BulkApprovalResult {
            action,
            succeeded,
            failed: results.len() - succeeded,
            results,
        };
        tracing::info!(
            action = ?action,
            succeeded = result.succeeded,
            failed = result.failed,
            "Bulk lead review finished"
        );
        Ok(result)
    }

    /// Moves a lead to another active assignee of the same campaign. Disposition,
    /// approval and the daily counters stay untouched.
    pub fn reassign<S: EngineStore>(
        store: &mut S,
        ctx: &RequestContext,
        lead_id: Uuid,
        user_id: Uuid,
        notes: Option<&str>,
    ) -> AppResult<(Lead, Uuid)> {
        ctx.require_admin()?;

        run_atomic(store, Isolation::ReadCommitted, |s| {
            let lead = s.lock_lead(lead_id)?.ok_or_else(lead_not_found)?;
            let previous = lead.assigned_to;
            if previous == user_id {
                return Ok((lead, previous));
            }

            let assignment = s.find_assignment(lead.campaign_id, user_id)?;
            if !assignment.is_some_and(|a| a.is_active()) {
                return Err(AppError::conflict_with_code(
                    "Target user has no active assignment in this campaign",
                    Some("user_id".to_string()),
                    error_codes::ASSIGNMENT_NOT_FOUND,
                ));
            }

            let note = match notes.map(str::trim).filter(|n| !n.is_empty()) {
                Some(n) => format!("reassigned from {} to {}: {}", previous, user_id, n),
                None => format!("reassigned from {} to {}", previous, user_id),
            };
            let changeset = LeadChangeset {
                assigned_to: Some(user_id),
                admin_notes: Some(Some(append_admin_note(
                    lead.admin_notes.as_deref(),
                    ctx.user_id,
                    &note,
                ))),
                updated_by: Some(Some(ctx.user_id)),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            let updated = s.update_lead(lead_id, &changeset)?;
            Ok((updated, previous))
        })
    }

    /// Closed leads awaiting review, oldest first.
    pub fn pending_approval<S: LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        campaign_id: Option<Uuid>,
    ) -> AppResult<Vec<Lead>> {
        ctx.require_admin()?;
        let filter = LeadFilter {
            campaign_id,
            sale_status: Some(SaleStatus::Closed),
            admin_approved: Some(false),
            ..Default::default()
        };
        let mut leads = store.list_leads(&filter)?;
        leads.sort_by(|a, b| {
            a.updated_at
                .cmp(&b.updated_at)
                .then_with(|| a.lead_number.cmp(&b.lead_number))
        });
        Ok(leads)
    }
}

fn lead_not_found() -> AppError {
    AppError::not_found_with_code("lead", error_codes::LEAD_NOT_FOUND)
}

fn ensure_can_access(ctx: &RequestContext, lead: &Lead) -> AppResult<()> {
    if ctx.is_admin() || lead.assigned_to == ctx.user_id {
        Ok(())
    } else {
        Err(lead_not_found())
    }
}

fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Admin notes are an append-only audit trail, one timestamped line per entry.
fn append_admin_note(existing: Option<&str>, actor: Uuid, entry: &str) -> String {
    let line = format!("[{}] {} by {}", Utc::now().to_rfc3339(), entry, actor);
    match existing.filter(|e| !e.is_empty()) {
        Some(existing) => format!("{}\n{}", existing, line),
        None => line,
    }
}
