use serde::{Deserialize, Serialize};

use crate::model::{
    account::{PublicAccount, Registration},
    principal::{PrincipalKind, Role},
};

/// Where a candidate stands in the approval process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Candidate profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDetails {
    pub first_name: String,
    pub last_name: String,
    pub document_type: String,
    pub document_number: u64,
    /// Only an administrator may move a candidate out of `Pending`.
    #[serde(default)]
    pub status: CandidateStatus,
    pub career_id: Option<u32>,
    pub election_id: Option<u32>,
    pub photo_url: Option<String>,
}

impl PrincipalKind for CandidateDetails {
    const ROLE: Role = Role::Candidate;
    const COLLECTION: &'static str = "candidates";

    fn on_register(&mut self) {
        self.status = CandidateStatus::Pending;
    }

    fn preserve_managed_fields(&mut self, current: &Self) {
        self.status = current.status;
    }
}

impl CandidateDetails {
    /// Stand in `election_id`. A change of election needs approval again.
    pub fn apply_to(&mut self, election_id: u32) {
        if self.election_id != Some(election_id) {
            self.election_id = Some(election_id);
            self.status = CandidateStatus::Pending;
        }
    }

    /// Leave whatever election this candidate stands in.
    pub fn withdraw(&mut self) {
        if self.election_id.take().is_some() {
            self.status = CandidateStatus::Pending;
        }
    }
}

pub type PublicCandidate = PublicAccount<CandidateDetails>;
pub type CandidateRegistration = Registration<CandidateDetails>;
