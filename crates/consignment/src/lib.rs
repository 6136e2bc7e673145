//! Consignment domain module.
//!
//! Goods delivered to a client location that remain owned stock until the
//! client settles (pays) or returns them. The lifecycle is
//! `ACTIVE → CLOSED`, driven by line-level decrements.

pub mod aging;
pub mod consignment;
pub mod draft;

pub use aging::{AgingPolicy, ConsignmentAge};
pub use consignment::{
    Consignment, ConsignmentId, ConsignmentLine, ConsignmentLineId, ConsignmentStatus, LineRelease,
};
pub use draft::{ConsignmentDraft, DraftConsignmentLine};
