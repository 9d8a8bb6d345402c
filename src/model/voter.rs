use serde::{Deserialize, Serialize};

use crate::model::{
    account::{PublicAccount, Registration},
    principal::{PrincipalKind, Role},
};

/// Voter profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDetails {
    pub first_name: String,
    pub last_name: String,
    pub document_type: String,
    pub document_number: u64,
    /// Inactive voters can neither log in nor use existing tokens.
    #[serde(default = "active_by_default")]
    pub active: bool,
    pub career_id: Option<u32>,
}

fn active_by_default() -> bool {
    true
}

impl PrincipalKind for VoterDetails {
    const ROLE: Role = Role::Voter;
    const COLLECTION: &'static str = "voters";

    fn in_good_standing(&self) -> bool {
        self.active
    }

    fn on_register(&mut self) {
        self.active = true;
    }

    fn preserve_managed_fields(&mut self, current: &Self) {
        self.active = current.active;
    }
}

pub type PublicVoter = PublicAccount<VoterDetails>;
pub type VoterRegistration = Registration<VoterDetails>;
