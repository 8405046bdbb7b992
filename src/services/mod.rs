pub mod campaigns_service;
pub mod context;
pub mod export_service;
pub mod kpi_service;
pub mod lead_generator;
pub mod lead_sources;
pub mod lead_workflow;
pub mod quota_allocator;

pub use campaigns_service::CampaignsService;
pub use export_service::ExportService;
pub use kpi_service::KpiService;
pub use lead_generator::LeadGenerator;
pub use lead_sources::LeadSourceRegistry;
pub use lead_workflow::LeadWorkflow;
pub use quota_allocator::QuotaAllocator;
