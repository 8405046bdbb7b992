pub mod allocation_counters;
pub mod campaigns;
pub mod leads;
