//! Cron entry point: tops up daily leads for one or every active campaign.

use chrono::NaiveDate;
use clap::{Arg, Command};
use diesel::{Connection, PgConnection};
use lead_engine::{
    config::Config,
    db::{
        enums::CampaignStatus,
        store::{CampaignStore, PgStore},
    },
    error::{AppError, AppResult},
    services::lead_generator::LeadGenerator,
};
use uuid::Uuid;

fn main() {
    dotenvy::dotenv().ok();

    let matches = Command::new("generate-leads")
        .about("Generate the daily lead allocation for campaigns")
        .arg(
            Arg::new("date")
                .short('d')
                .long("date")
                .value_name("YYYY-MM-DD")
                .help("Allocation date, defaults to today in the business timezone"),
        )
        .arg(
            Arg::new("campaign")
                .short('c')
                .long("campaign")
                .value_name("UUID")
                .help("Only this campaign, defaults to every active campaign"),
        )
        .get_matches();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    lead_engine::init_tracing(&config);

    let date = match matches.get_one::<String>("date") {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                eprintln!("Invalid --date '{}': {}", raw, e);
                std::process::exit(2);
            }
        },
        None => config.engine().today(),
    };
    let campaign = match matches.get_one::<String>("campaign").map(|raw| Uuid::parse_str(raw)) {
        Some(Ok(id)) => Some(id),
        Some(Err(e)) => {
            eprintln!("Invalid --campaign: {}", e);
            std::process::exit(2);
        }
        None => None,
    };

    if let Err(e) = run(&config, date, campaign) {
        tracing::error!(error = %e, "Lead generation run aborted");
        std::process::exit(1);
    }
}

fn run(config: &Config, date: NaiveDate, campaign: Option<Uuid>) -> AppResult<()> {
    let mut conn = PgConnection::establish(&config.database_url)
        .map_err(|e| AppError::Config(format!("Failed to connect to database: {}", e)))?;
    let mut store = PgStore::new(&mut conn);

    let campaign_ids = match campaign {
        Some(id) => vec![id],
        None => store
            .list_campaigns(Some(CampaignStatus::Active))?
            .into_iter()
            .filter(|c| c.covers(date))
            .map(|c| c.id)
            .collect(),
    };

    let mut generated = 0;
    for campaign_id in campaign_ids {
        match LeadGenerator::generate_daily_leads(&mut store, campaign_id, date, None) {
            Ok(result) => generated += result.created_count,
            Err(e @ (AppError::Database(_) | AppError::Pool(_))) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    campaign_id = %campaign_id,
                    date = %date,
                    code = e.code(),
                    error = %e,
                    "Campaign skipped"
                );
            }
        }
    }

    tracing::info!(date = %date, generated, "Lead generation run complete");
    Ok(())
}
