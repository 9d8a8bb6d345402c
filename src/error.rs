use std::fmt::{Display, Formatter};

use argon2::Error as Argon2Error;
use log::{debug, error};
use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::{status::Custom, Responder},
    serde::json::{json, Json},
    Request,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Hash(#[from] Argon2Error),
    #[error("Incorrect email or password")]
    InvalidCredentials(CredentialFailure),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Construct a [`Error::NotFound`] describing the missing item.
    pub fn not_found(what: impl Display) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::BadRequest(_) => Status::BadRequest,
            Self::InvalidCredentials(_) | Self::Unauthorized(_) => Status::Unauthorized,
            Self::Forbidden(_) => Status::Forbidden,
            Self::NotFound(_) => Status::NotFound,
            Self::Conflict(_) => Status::Conflict,
            Self::Db(_) | Self::Hash(_) | Self::Internal(_) => Status::InternalServerError,
        }
    }
}

/// Why a login attempt was refused.
///
/// Callers only ever see [`Error::InvalidCredentials`]'s uniform message;
/// the reason exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownEmail,
    WrongPassword,
    Disabled,
    /// The stored hash could not be parsed.
    UnusableHash,
}

impl Display for CredentialFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::UnknownEmail => "unknown email",
            Self::WrongPassword => "wrong password",
            Self::Disabled => "account disabled",
            Self::UnusableHash => "unusable stored hash",
        };
        write!(f, "{reason}")
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let message = if status.class() == StatusClass::ServerError {
            error!("{self}");
            "Internal server error".to_string()
        } else {
            debug!("{self:?}");
            self.to_string()
        };
        Custom(status, Json(json!({ "message": message }))).respond_to(req)
    }
}
