use serde::{Deserialize, Serialize};

use crate::model::{candidate::CandidateStatus, principal::PrincipalId};

/// Login credentials. The password is plaintext and is never stored.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A request to re-check a principal's current password, e.g. before a
/// profile edit.
#[derive(Clone, Serialize, Deserialize)]
pub struct PasswordCheck {
    #[serde(alias = "adminId", alias = "voterId", alias = "candidateId")]
    pub id: PrincipalId,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCheckResult {
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoterStatusUpdate {
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandidateStatusUpdate {
    pub status: CandidateStatus,
}

/// A candidate's application to stand in an election.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ElectionApplication {
    #[serde(alias = "electionId")]
    pub election_id: u32,
}
