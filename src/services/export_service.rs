use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::api::error_codes;
use crate::db::models::lead::{LeadExportRow, LeadFilter};
use crate::db::store::{CampaignStore, LeadStore};
use crate::error::{AppError, AppResult};
use crate::services::context::RequestContext;
use crate::validation::campaign::validate_date_range;

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

const CSV_HEADER: [&str; 14] = [
    "lead_number",
    "campaign_id",
    "assigned_to",
    "assigned_date",
    "customer_name",
    "contact_number",
    "whatsapp_number",
    "lead_source",
    "sale_status",
    "follow_up_status",
    "reason_not_closed",
    "notes",
    "admin_approved",
    "updated_at",
];

pub struct ExportService;

impl ExportService {
    /// Every lead of the campaign assigned within `[start_date, end_date]`, whatever
    /// its status, ordered by assigned date then lead number.
    pub fn export_leads<S: CampaignStore + LeadStore>(
        store: &mut S,
        ctx: &RequestContext,
        campaign_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        max_days: i64,
    ) -> AppResult<Vec<LeadExportRow>> {
        ctx.require_admin()?;
        validate_date_range(start_date, end_date, max_days)?;

        if store.find_campaign(campaign_id)?.is_none() {
            return Err(AppError::not_found_with_code(
                "campaign",
                error_codes::CAMPAIGN_NOT_FOUND,
            ));
        }

        let leads = store.list_leads(&LeadFilter {
            campaign_id: Some(campaign_id),
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Default::default()
        })?;

        tracing::info!(
            campaign_id = %campaign_id,
            start_date = %start_date,
            end_date = %end_date,
            rows = leads.len(),
            "Leads exported"
        );
        Ok(leads.into_iter().map(LeadExportRow::from).collect())
    }

    /// CSV with a fixed header row, present even when there are no rows.
    pub fn to_csv(rows: &[LeadExportRow]) -> AppResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        writer.write_record(CSV_HEADER)?;
        for row in rows {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::internal(format!("Failed to flush CSV export: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::internal(format!("CSV export is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::{FollowUpStatus, SaleStatus};
    use chrono::{TimeZone, Utc};

    #[test]
    fn csv_has_header_even_when_empty() {
        let csv = ExportService::to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("lead_number,campaign_id,assigned_to,assigned_date"));
    }

    #[test]
    fn csv_rows_follow_header_order() {
        let row = LeadExportRow {
            lead_number: "LABCDEF-261019-0001".to_string(),
            campaign_id: Uuid::nil(),
            assigned_to: Uuid::nil(),
            assigned_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            customer_name: "Asha, Rao".to_string(),
            contact_number: "+15550001111".to_string(),
            whatsapp_number: String::new(),
            lead_source: "walk_in".to_string(),
            sale_status: SaleStatus::NotInterested,
            follow_up_status: FollowUpStatus::CallDone,
            reason_not_closed: String::new(),
            notes: String::new(),
            admin_approved: false,
            updated_at: Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap(),
        };
        let csv = ExportService::to_csv(&[row]).unwrap();
        let data = csv.lines().nth(1).unwrap();
        assert!(data.starts_with("LABCDEF-261019-0001,"));
        assert!(data.contains(",\"Asha, Rao\","));
        assert!(data.contains(",not_interested,call_done,"));
        assert!(data.contains(",false,"));
    }
}
