use log::info;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        account::AccountUpdate,
        admin::AdminDetails,
        api::{Credentials, PasswordCheck, PasswordCheckResult, VoterStatusUpdate},
        auth::{Authenticated, LoginResponse, VoterService},
        principal::PrincipalId,
        voter::{PublicVoter, VoterDetails, VoterRegistration},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        register,
        login,
        validate_password,
        profile,
        get_voters,
        get_voter,
        modify_voter,
        set_voter_status,
        delete_voter,
    ]
}

#[post("/voters", data = "<registration>", format = "json")]
async fn register(
    registration: Json<VoterRegistration>,
    voters: &State<VoterService>,
) -> Result<Json<PublicVoter>> {
    Ok(Json(voters.register(registration.into_inner()).await?))
}

#[post("/voters/login", data = "<credentials>", format = "json")]
async fn login(
    credentials: Json<Credentials>,
    voters: &State<VoterService>,
) -> Result<Json<LoginResponse<VoterDetails>>> {
    let response = voters
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(response))
}

#[post("/voters/validate-password", data = "<check>", format = "json")]
async fn validate_password(
    check: Json<PasswordCheck>,
    voters: &State<VoterService>,
) -> Result<Json<PasswordCheckResult>> {
    let valid = voters.validate_password(check.id, &check.password).await?;
    Ok(Json(PasswordCheckResult { valid }))
}

#[get("/voters/profile")]
async fn profile(token: Authenticated<VoterDetails>) -> Json<PublicVoter> {
    Json(token.account)
}

#[get("/voters")]
async fn get_voters(
    _token: Authenticated<AdminDetails>,
    voters: &State<VoterService>,
) -> Result<Json<Vec<PublicVoter>>> {
    Ok(Json(voters.list().await?))
}

#[get("/voters/<voter_id>")]
async fn get_voter(
    _token: Authenticated<AdminDetails>,
    voter_id: PrincipalId,
    voters: &State<VoterService>,
) -> Result<Json<PublicVoter>> {
    Ok(Json(voters.find(voter_id).await?))
}

#[patch("/voters/<voter_id>", data = "<update>", format = "json")]
async fn modify_voter(
    token: Authenticated<VoterDetails>,
    voter_id: PrincipalId,
    update: Json<AccountUpdate<VoterDetails>>,
    voters: &State<VoterService>,
) -> Result<Json<PublicVoter>> {
    token.ensure_is(voter_id)?;
    Ok(Json(voters.update(voter_id, update.into_inner()).await?))
}

#[patch("/voters/<voter_id>/status", data = "<status>", format = "json")]
async fn set_voter_status(
    token: Authenticated<AdminDetails>,
    voter_id: PrincipalId,
    status: Json<VoterStatusUpdate>,
    voters: &State<VoterService>,
) -> Result<Json<PublicVoter>> {
    let active = status.active;
    let voter = voters
        .modify_details(voter_id, |details| details.active = active)
        .await?;
    info!("Admin {} set voter {voter_id} active={active}", token.id());
    Ok(Json(voter))
}

#[delete("/voters/<voter_id>")]
async fn delete_voter(
    token: Authenticated<VoterDetails>,
    voter_id: PrincipalId,
    voters: &State<VoterService>,
) -> Result<()> {
    token.ensure_is(voter_id)?;
    voters.delete(voter_id).await
}
