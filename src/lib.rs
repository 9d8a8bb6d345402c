#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use std::sync::Arc;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;
use crate::model::{
    admin::AdminDetails,
    auth::{AdminService, CandidateService, PasswordHasher, TokenIssuer, VoterService},
    candidate::CandidateDetails,
    store::CredentialStore,
    voter::VoterDetails,
};

/// Assemble the server: configuration, MongoDB-backed accounts, request
/// logging and every route.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .mount("/", api::routes())
}

/// The account services for every principal kind. They share one token
/// issuer, so one signing key and one token lifetime, and one hasher.
pub struct Accounts {
    pub admins: AdminService,
    pub voters: VoterService,
    pub candidates: CandidateService,
}

impl Accounts {
    pub fn new(
        config: &Config,
        admins: Arc<dyn CredentialStore<AdminDetails>>,
        voters: Arc<dyn CredentialStore<VoterDetails>>,
        candidates: Arc<dyn CredentialStore<CandidateDetails>>,
    ) -> Self {
        let tokens = Arc::new(TokenIssuer::new(config.jwt_secret(), config.auth_ttl()));
        let hasher = PasswordHasher::new(config.hash_cost());
        Self {
            admins: AdminService::new(admins, tokens.clone(), hasher),
            voters: VoterService::new(voters, tokens.clone(), hasher),
            candidates: CandidateService::new(candidates, tokens, hasher),
        }
    }

    /// Place every service into managed state.
    pub fn manage(self, rocket: Rocket<Build>) -> Rocket<Build> {
        rocket
            .manage(self.admins)
            .manage(self.voters)
            .manage(self.candidates)
    }
}

#[cfg(test)]
pub(crate) use test_support::{bearer, login_as, rocket_for_tests, MemoryStores};
