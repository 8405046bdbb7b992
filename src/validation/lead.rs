use std::collections::HashSet;

use uuid::Uuid;

use crate::db::enums::{FollowUpStatus, SaleStatus};
use crate::db::models::lead::Lead;
use crate::error::AppError;
use crate::services::lead_sources::LeadSourceRegistry;
use crate::validation::rules::validate_phone_number;

const MAX_NAME_LEN: usize = 255;
const MAX_NOTE_LEN: usize = 5000;

pub struct UpdateLeadChanges<'a> {
    pub customer_name: Option<&'a str>,
    pub contact_number: Option<&'a str>,
    pub whatsapp_number: Option<&'a str>,
    pub lead_source: Option<&'a str>,
    pub sale_status: Option<SaleStatus>,
    pub follow_up_status: Option<FollowUpStatus>,
    pub reason_not_closed: Option<&'a str>,
    pub notes: Option<&'a str>,
}

impl UpdateLeadChanges<'_> {
    fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.contact_number.is_none()
            && self.whatsapp_number.is_none()
            && self.lead_source.is_none()
            && self.sale_status.is_none()
            && self.follow_up_status.is_none()
            && self.reason_not_closed.is_none()
            && self.notes.is_none()
    }

    /// Whether the change touches the fields governed by the lead source rules.
    pub fn touches_contact_rules(&self) -> bool {
        self.lead_source.is_some() || self.whatsapp_number.is_some()
    }
}

/// Field-level checks on an update request, before any lead is loaded.
pub fn validate_update_lead(changes: &UpdateLeadChanges) -> Result<(), AppError> {
    if changes.is_empty() {
        return Err(AppError::validation("No update data provided"));
    }
    if let Some(name) = changes.customer_name {
        if name.len() > MAX_NAME_LEN {
            return Err(AppError::invalid_field(
                "customer_name",
                "TOO_LONG",
                "Customer name is too long (max 255 characters)",
            ));
        }
    }
    for (field, value) in [
        ("contact_number", changes.contact_number),
        ("whatsapp_number", changes.whatsapp_number),
    ] {
        if let Some(phone) = value.filter(|p| !p.trim().is_empty()) {
            if validate_phone_number(phone).is_err() {
                return Err(AppError::invalid_field(
                    field,
                    "INVALID_PHONE_NUMBER",
                    format!("{} is not a valid phone number", phone),
                ));
            }
        }
    }
    for (field, value) in [
        ("reason_not_closed", changes.reason_not_closed),
        ("notes", changes.notes),
    ] {
        if value.is_some_and(|v| v.len() > MAX_NOTE_LEN) {
            return Err(AppError::invalid_field(
                field,
                "TOO_LONG",
                format!("{} is too long (max 5000 characters)", field),
            ));
        }
    }
    Ok(())
}

/// Checks the lead as it would look after an update against the source catalogue.
pub fn validate_lead_contacts(lead: &Lead, registry: &LeadSourceRegistry) -> Result<(), AppError> {
    let Some(source_key) = lead.lead_source.as_deref() else {
        return Ok(());
    };
    let Some(source) = registry.get(source_key) else {
        return Err(AppError::invalid_field(
            "lead_source",
            "UNKNOWN_LEAD_SOURCE",
            format!("Unknown lead source '{}'", source_key),
        ));
    };
    let has_whatsapp = lead
        .whatsapp_number
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());
    if source.requires_secondary_contact && !has_whatsapp {
        return Err(AppError::invalid_field(
            "whatsapp_number",
            "REQUIRED",
            format!("WhatsApp number is required for {} leads", source.label),
        ));
    }
    Ok(())
}

/// Deduplicates bulk ids, keeping first-seen order, and enforces the batch bounds.
pub fn validate_bulk_ids(lead_ids: &[Uuid], max_batch: usize) -> Result<Vec<Uuid>, AppError> {
    let mut seen = HashSet::with_capacity(lead_ids.len());
    let unique: Vec<Uuid> = lead_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if unique.is_empty() {
        return Err(AppError::invalid_field(
            "lead_ids",
            "REQUIRED",
            "At least one lead id is required",
        ));
    }
    if unique.len() > max_batch {
        return Err(AppError::invalid_field(
            "lead_ids",
            "BATCH_TOO_LARGE",
            format!("At most {} leads can be processed at once", max_batch),
        ));
    }
    Ok(unique)
}
