//! Domain services. Compose the checker façade with the capability ports,
//! enforce the state machines, and orchestrate the multi-step flows
//! (edit + version, rollback, decision with side effects).

mod bids;
mod tenders;

pub use bids::BidService;
pub use tenders::TenderService;
