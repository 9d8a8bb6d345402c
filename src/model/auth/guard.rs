use log::{error, warn};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};

use crate::error::Error;
use crate::logging::Principal;
use crate::model::{
    account::PublicAccount,
    principal::{PrincipalId, PrincipalKind},
};

use super::{service::AccountService, token::Claims};

pub const AUTHORIZATION_HEADER: &str = "Authorization";
const BEARER_SCHEME: &str = "Bearer";

/// A request guard admitting only requests carrying a valid bearer token for
/// a live principal of kind `K`. The resolved principal, without its
/// password hash, is available to the handler.
#[derive(Debug)]
pub struct Authenticated<K> {
    pub claims: Claims,
    pub account: PublicAccount<K>,
}

impl<K> Authenticated<K> {
    /// The ID of the authenticated principal.
    pub fn id(&self) -> PrincipalId {
        self.account.id
    }

    /// Succeed only if the authenticated principal is `id`.
    pub fn ensure_is(&self, id: PrincipalId) -> Result<(), Error> {
        if self.id() == id {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "principal {} may not act on principal {id}",
                self.id()
            )))
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header. The
/// scheme is case-insensitive.
fn bearer_token<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    parse_bearer(req.headers().get_one(AUTHORIZATION_HEADER)?)
}

fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(char::is_whitespace)?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty()).then_some(token)
}

#[rocket::async_trait]
impl<'r, K> FromRequest<'r> for Authenticated<K>
where
    K: PrincipalKind,
{
    type Error = Error;

    /// Verify the bearer token and re-resolve its subject in this kind's
    /// store. Anything short of full success is a failure, never a forward.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let service = match req.guard::<&State<AccountService<K>>>().await {
            Outcome::Success(service) => service,
            _ => {
                error!("No account service is managed for {}", K::ROLE);
                return Outcome::Error((
                    Status::InternalServerError,
                    Error::Internal(format!("{} accounts unavailable", K::ROLE)),
                ));
            }
        };

        let token = match bearer_token(req) {
            Some(token) => token,
            None => {
                return Outcome::Error((
                    Status::Unauthorized,
                    Error::Unauthorized("missing bearer token".to_string()),
                ))
            }
        };

        match service.resolve(token).await {
            Ok((claims, account)) => {
                Principal::record(req, K::ROLE, account.id);
                Outcome::Success(Self { claims, account })
            }
            Err(err) => {
                let status = match err {
                    Error::Db(_) | Error::Internal(_) => Status::InternalServerError,
                    _ => Status::Unauthorized,
                };
                warn!("Rejected {} guard: {err}", K::ROLE);
                Outcome::Error((status, err))
            }
        }
    }
}
