use log::info;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        account::AccountUpdate,
        admin::AdminDetails,
        api::{
            CandidateStatusUpdate, Credentials, ElectionApplication, PasswordCheck,
            PasswordCheckResult,
        },
        auth::{Authenticated, CandidateService, LoginResponse},
        candidate::{CandidateDetails, CandidateRegistration, PublicCandidate},
        principal::PrincipalId,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        register,
        login,
        validate_password,
        profile,
        get_candidates,
        get_candidate,
        modify_candidate,
        set_candidate_status,
        apply_to_election,
        withdraw_from_election,
        delete_candidate,
    ]
}

#[post("/candidates", data = "<registration>", format = "json")]
async fn register(
    registration: Json<CandidateRegistration>,
    candidates: &State<CandidateService>,
) -> Result<Json<PublicCandidate>> {
    Ok(Json(candidates.register(registration.into_inner()).await?))
}

#[post("/candidates/login", data = "<credentials>", format = "json")]
async fn login(
    credentials: Json<Credentials>,
    candidates: &State<CandidateService>,
) -> Result<Json<LoginResponse<CandidateDetails>>> {
    let response = candidates
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(response))
}

#[post("/candidates/validate-password", data = "<check>", format = "json")]
async fn validate_password(
    check: Json<PasswordCheck>,
    candidates: &State<CandidateService>,
) -> Result<Json<PasswordCheckResult>> {
    let valid = candidates.validate_password(check.id, &check.password).await?;
    Ok(Json(PasswordCheckResult { valid }))
}

#[get("/candidates/profile")]
async fn profile(token: Authenticated<CandidateDetails>) -> Json<PublicCandidate> {
    Json(token.account)
}

#[get("/candidates")]
async fn get_candidates(
    candidates: &State<CandidateService>,
) -> Result<Json<Vec<PublicCandidate>>> {
    Ok(Json(candidates.list().await?))
}

#[get("/candidates/<candidate_id>")]
async fn get_candidate(
    candidate_id: PrincipalId,
    candidates: &State<CandidateService>,
) -> Result<Json<PublicCandidate>> {
    Ok(Json(candidates.find(candidate_id).await?))
}

#[patch("/candidates/<candidate_id>", data = "<update>", format = "json")]
async fn modify_candidate(
    token: Authenticated<CandidateDetails>,
    candidate_id: PrincipalId,
    update: Json<AccountUpdate<CandidateDetails>>,
    candidates: &State<CandidateService>,
) -> Result<Json<PublicCandidate>> {
    token.ensure_is(candidate_id)?;
    Ok(Json(candidates.update(candidate_id, update.into_inner()).await?))
}

#[patch("/candidates/<candidate_id>/status", data = "<update>", format = "json")]
async fn set_candidate_status(
    token: Authenticated<AdminDetails>,
    candidate_id: PrincipalId,
    update: Json<CandidateStatusUpdate>,
    candidates: &State<CandidateService>,
) -> Result<Json<PublicCandidate>> {
    let status = update.status;
    let candidate = candidates
        .modify_details(candidate_id, |details| details.status = status)
        .await?;
    info!(
        "Admin {} set candidate {candidate_id} to {status:?}",
        token.id()
    );
    Ok(Json(candidate))
}

#[post("/candidates/<candidate_id>/apply", data = "<application>", format = "json")]
async fn apply_to_election(
    token: Authenticated<CandidateDetails>,
    candidate_id: PrincipalId,
    application: Json<ElectionApplication>,
    candidates: &State<CandidateService>,
) -> Result<Json<PublicCandidate>> {
    token.ensure_is(candidate_id)?;
    let election_id = application.election_id;
    let candidate = candidates
        .modify_details(candidate_id, |details| details.apply_to(election_id))
        .await?;
    info!("Candidate {candidate_id} applied to election {election_id}");
    Ok(Json(candidate))
}

#[patch("/candidates/<candidate_id>/withdraw-election")]
async fn withdraw_from_election(
    token: Authenticated<CandidateDetails>,
    candidate_id: PrincipalId,
    candidates: &State<CandidateService>,
) -> Result<Json<PublicCandidate>> {
    token.ensure_is(candidate_id)?;
    let candidate = candidates
        .modify_details(candidate_id, CandidateDetails::withdraw)
        .await?;
    info!("Candidate {candidate_id} withdrew from its election");
    Ok(Json(candidate))
}

#[delete("/candidates/<candidate_id>")]
async fn delete_candidate(
    _token: Authenticated<AdminDetails>,
    candidate_id: PrincipalId,
    candidates: &State<CandidateService>,
) -> Result<()> {
    candidates.delete(candidate_id).await
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
        serde::json::{json, Value},
    };

    use crate::model::{candidate::CandidateStatus, principal::Role, store::CredentialStore};
    use crate::{login_as, MemoryStores};

    use super::*;

    async fn whoami(client: &Client, auth: Header<'static>) -> PublicCandidate {
        let response = client.get(uri!(profile)).header(auth).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test]
    async fn registration_starts_pending(client: Client) {
        let mut registration = CandidateRegistration::example();
        registration.details.status = CandidateStatus::Approved;

        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(registration).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let candidate: PublicCandidate = response.into_json().await.unwrap();
        assert_eq!(CandidateStatus::Pending, candidate.details.status);

        // Listing and lookup are public.
        let response = client.get(uri!(get_candidates)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!("pending", body[0]["status"]);
        assert!(body[0].get("password_hash").is_none());

        let response = client
            .get(uri!(get_candidate(candidate.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
    }

    #[backend_test(candidate)]
    async fn login_and_profile(client: Client, auth: Header<'static>) {
        let me = whoami(&client, auth).await;
        assert_eq!(CandidateRegistration::example().email, me.email);

        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(Credentials::of(&CandidateRegistration::example())).to_string())
            .dispatch()
            .await;
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(me.id, body["candidate"]["id"]);
    }

    #[backend_test(candidate)]
    async fn admin_approves_candidate(client: Client, auth: Header<'static>) {
        let me = whoami(&client, auth.clone()).await;
        let admin_auth = login_as(&client, Role::Admin).await;

        // Candidates cannot approve themselves, by either route.
        let response = client
            .patch(uri!(set_candidate_status(me.id)))
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!({ "status": "approved" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        let mut details = me.details.clone();
        details.status = CandidateStatus::Approved;
        let update = AccountUpdate {
            details: Some(details),
            ..Default::default()
        };
        let response = client
            .patch(uri!(modify_candidate(me.id)))
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!(update).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let modified: PublicCandidate = response.into_json().await.unwrap();
        assert_eq!(CandidateStatus::Pending, modified.details.status);

        // An admin can.
        let response = client
            .patch(uri!(set_candidate_status(me.id)))
            .header(ContentType::JSON)
            .header(admin_auth)
            .body(json!({ "status": "approved" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let approved: PublicCandidate = response.into_json().await.unwrap();
        assert_eq!(CandidateStatus::Approved, approved.details.status);
        assert_eq!(CandidateStatus::Approved, whoami(&client, auth).await.details.status);
    }

    #[backend_test(candidate)]
    async fn only_admins_delete_candidates(
        client: Client,
        auth: Header<'static>,
        stores: MemoryStores,
    ) {
        let me = whoami(&client, auth.clone()).await;

        let response = client
            .delete(uri!(delete_candidate(me.id)))
            .header(auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        assert_eq!(1, stores.candidates.count().await.unwrap());

        let admin_auth = login_as(&client, Role::Admin).await;
        let response = client
            .delete(uri!(delete_candidate(me.id)))
            .header(admin_auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(0, stores.candidates.count().await.unwrap());

        // The candidate's token now names no one.
        let response = client.get(uri!(profile)).header(auth).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());

        // Deleting again finds nothing.
        let response = client
            .delete(uri!(delete_candidate(me.id)))
            .header(admin_auth)
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(candidate)]
    async fn candidate_token_is_not_a_voter_token(client: Client, auth: Header<'static>) {
        let response = client
            .get("/voters/profile")
            .header(auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .get("/administrators/profile")
            .header(auth)
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test(candidate)]
    async fn candidates_may_only_modify_themselves(client: Client, auth: Header<'static>) {
        let other = client
            .rocket()
            .state::<CandidateService>()
            .unwrap()
            .register(CandidateRegistration {
                email: "lucia@univote.edu".to_string(),
                ..CandidateRegistration::example()
            })
            .await
            .unwrap();

        let update = AccountUpdate::<CandidateDetails> {
            password: Some("taken-over".to_string()),
            ..Default::default()
        };
        let response = client
            .patch(uri!(modify_candidate(other.id)))
            .header(ContentType::JSON)
            .header(auth)
            .body(json!(update).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
    }

    #[backend_test(candidate)]
    async fn apply_and_withdraw(client: Client, auth: Header<'static>) {
        let me = whoami(&client, auth.clone()).await;
        let admin_auth = login_as(&client, Role::Admin).await;
        let response = client
            .patch(uri!(set_candidate_status(me.id)))
            .header(ContentType::JSON)
            .header(admin_auth)
            .body(json!({ "status": "approved" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let response = client
            .post(uri!(apply_to_election(me.id)))
            .header(ContentType::JSON)
            .header(auth.clone())
            .body(json!({ "electionId": 5 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let applied: PublicCandidate = response.into_json().await.unwrap();
        assert_eq!(Some(5), applied.details.election_id);
        assert_eq!(CandidateStatus::Pending, applied.details.status);

        let response = client
            .patch(uri!(withdraw_from_election(me.id)))
            .header(auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let withdrawn: PublicCandidate = response.into_json().await.unwrap();
        assert_eq!(None, withdrawn.details.election_id);

        // Only for oneself.
        let response = client
            .patch(uri!(withdraw_from_election(me.id + 1)))
            .header(auth)
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
    }
}
