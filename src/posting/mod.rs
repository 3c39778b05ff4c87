// Module declarations
pub(crate) mod posting_service;
pub(crate) mod posting_traits;

// Re-export the public interface
pub use posting_service::PostingService;
pub use posting_traits::{PostingServiceTrait, VoidOutcome};
