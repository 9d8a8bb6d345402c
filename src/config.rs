use std::sync::Arc;

use chrono::Duration;
use log::{error, info};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    admin::{AdminDetails, AdminRegistration},
    candidate::CandidateDetails,
    mongodb::{ensure_indexes_exist, MongoStore},
    voter::VoterDetails,
};
use crate::Accounts;

/// Tokens last a day unless configured otherwise.
const DEFAULT_AUTH_TTL: u32 = 24 * 60 * 60;
const DEFAULT_HASH_COST: u32 = 3;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Clone, Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default = "default_auth_ttl")]
    auth_ttl: u32,
    #[serde(default = "default_hash_cost")]
    hash_cost: u32,
    default_admin_email: String,
    // secrets
    default_admin_password: String,
    jwt_secret: String,
}

fn default_auth_ttl() -> u32 {
    DEFAULT_AUTH_TTL
}

fn default_hash_cost() -> u32 {
    DEFAULT_HASH_COST
}

impl Config {
    /// Valid lifetime of issued bearer tokens.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Argon2 iterations used for new password hashes.
    pub fn hash_cost(&self) -> u32 {
        self.hash_cost
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.hash_cost == 0 {
            return Err("hash_cost must be at least 1".to_string());
        }
        if self.jwt_secret.is_empty() {
            return Err("jwt_secret must not be empty".to_string());
        }
        Ok(())
    }

    /// The administrator created when there are none.
    pub fn default_admin(&self) -> AdminRegistration {
        AdminRegistration {
            email: self.default_admin_email.clone(),
            password: self.default_admin_password.clone(),
            details: AdminDetails::bootstrap(),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        if let Err(reason) = config.validate() {
            error!("Invalid application config: {reason}");
            return Err(rocket);
        }

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that connects to MongoDB, ensures indexes and a default
/// administrator exist, and places the account services for every principal
/// kind into managed state. Must be attached after [`ConfigFairing`].
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.state::<Config>() {
            Some(config) => config.clone(),
            None => {
                error!("Application config must be loaded before the database");
                return Err(rocket);
            }
        };

        // Load the database config.
        let db_config = match rocket.figment().extract::<DbConfig>() {
            Ok(db_config) => db_config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(db_config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to create database indexes: {e}");
            return Err(rocket);
        }

        let accounts = Accounts::new(
            &config,
            Arc::new(MongoStore::<AdminDetails>::from_db(&db)),
            Arc::new(MongoStore::<VoterDetails>::from_db(&db)),
            Arc::new(MongoStore::<CandidateDetails>::from_db(&db)),
        );

        // Ensure there is at least one admin user.
        match accounts.admins.ensure_exists(config.default_admin()).await {
            Ok(true) => info!(
                "Created default administrator {}",
                config.default_admin_email
            ),
            Ok(false) => {}
            Err(e) => {
                error!("Failed to create default administrator: {e}");
                return Err(rocket);
            }
        }
        info!("...database connection online!");

        // Manage the state.
        Ok(accounts.manage(rocket))
    }
}

/// Get the name of the database to use.
fn get_database_name() -> String {
    "univote".to_string()
}
