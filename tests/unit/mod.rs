pub mod support;

mod campaigns;
mod export;
mod generation;
mod kpis;
mod requests;
mod workflow;
