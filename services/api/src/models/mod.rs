//! API models for request and response payloads

pub mod archive;
pub mod request;

pub use archive::{ArchiveSummary, ArchivedClient, ArchivedProcess, ArchivedRequest};
pub use request::{
    ApprovalFlags, ApprovalTimes, ClientData, DecisionPayload, DecisionResponse, LoadType, Notes,
    PaymentMethod, RequestRecord, RequestResponse, RequestSummary,
};
