//! API-compatible request and response types.

mod requests;

pub use requests::{
    CandidateStatusUpdate, Credentials, ElectionApplication, PasswordCheck, PasswordCheckResult,
    VoterStatusUpdate,
};
