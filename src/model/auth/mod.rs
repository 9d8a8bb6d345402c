//! Authentication: password hashing, bearer tokens, the per-kind account
//! service and its route guard.

mod guard;
mod password;
mod service;
mod token;

pub use guard::{Authenticated, AUTHORIZATION_HEADER};
pub use password::PasswordHasher;
pub use service::{AccountService, LoginResponse};
pub use token::{Claims, TokenError, TokenIssuer};

use crate::model::{admin::AdminDetails, candidate::CandidateDetails, voter::VoterDetails};

pub type AdminService = AccountService<AdminDetails>;
pub type VoterService = AccountService<VoterDetails>;
pub type CandidateService = AccountService<CandidateDetails>;
