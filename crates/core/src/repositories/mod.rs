//! File-backed repositories for triage records.
//!
//! Repositories own the storage layout and the workflow rules around it.
//! They contain **only** data operations; HTTP concerns live in `api-rest`.

pub mod referrals;

pub use referrals::{
    DecisionRequest, ReferralDetail, ReferralFilter, ReferralService, ReferralSubmission,
};
