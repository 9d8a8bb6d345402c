use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        account::AccountUpdate,
        admin::{AdminDetails, AdminRegistration, PublicAdmin},
        api::{Credentials, PasswordCheck, PasswordCheckResult},
        auth::{AdminService, Authenticated, LoginResponse},
        principal::PrincipalId,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        login,
        validate_password,
        profile,
        get_admins,
        get_admin,
        create_admin,
        modify_admin,
        delete_admin,
    ]
}

#[post("/administrators/login", data = "<credentials>", format = "json")]
async fn login(
    credentials: Json<Credentials>,
    admins: &State<AdminService>,
) -> Result<Json<LoginResponse<AdminDetails>>> {
    let response = admins
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(response))
}

#[post("/administrators/validate-password", data = "<check>", format = "json")]
async fn validate_password(
    check: Json<PasswordCheck>,
    admins: &State<AdminService>,
) -> Result<Json<PasswordCheckResult>> {
    let valid = admins.validate_password(check.id, &check.password).await?;
    Ok(Json(PasswordCheckResult { valid }))
}

#[get("/administrators/profile")]
async fn profile(token: Authenticated<AdminDetails>) -> Json<PublicAdmin> {
    Json(token.account)
}

#[get("/administrators")]
async fn get_admins(
    _token: Authenticated<AdminDetails>,
    admins: &State<AdminService>,
) -> Result<Json<Vec<PublicAdmin>>> {
    Ok(Json(admins.list().await?))
}

#[get("/administrators/<admin_id>")]
async fn get_admin(
    _token: Authenticated<AdminDetails>,
    admin_id: PrincipalId,
    admins: &State<AdminService>,
) -> Result<Json<PublicAdmin>> {
    Ok(Json(admins.find(admin_id).await?))
}

#[post("/administrators", data = "<new_admin>", format = "json")]
async fn create_admin(
    _token: Authenticated<AdminDetails>,
    new_admin: Json<AdminRegistration>,
    admins: &State<AdminService>,
) -> Result<Json<PublicAdmin>> {
    Ok(Json(admins.register(new_admin.into_inner()).await?))
}

#[patch("/administrators/<admin_id>", data = "<update>", format = "json")]
async fn modify_admin(
    _token: Authenticated<AdminDetails>,
    admin_id: PrincipalId,
    update: Json<AccountUpdate<AdminDetails>>,
    admins: &State<AdminService>,
) -> Result<Json<PublicAdmin>> {
    Ok(Json(admins.update(admin_id, update.into_inner()).await?))
}

#[delete("/administrators/<admin_id>")]
async fn delete_admin(
    _token: Authenticated<AdminDetails>,
    admin_id: PrincipalId,
    admins: &State<AdminService>,
) -> Result<()> {
    admins.delete_unless_last(admin_id).await
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::{json, serde_json, Value},
    };

    use crate::model::store::CredentialStore;
    use crate::{bearer, MemoryStores};

    use super::*;

    #[backend_test(admin)]
    async fn profile_resolves_logged_in_admin(client: Client, auth: Header<'static>) {
        let response = client.get(uri!(profile)).header(auth).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let admin: PublicAdmin = response.into_json().await.unwrap();
        assert_eq!(AdminRegistration::example().email, admin.email);
        assert_eq!(AdminRegistration::example().details, admin.details);
    }

    #[backend_test]
    async fn login_response_shape(client: Client) {
        let registration = AdminRegistration::example();
        client
            .rocket()
            .state::<AdminService>()
            .unwrap()
            .register(registration.clone())
            .await
            .unwrap();

        let response =
            login_expect_status(&client, &Credentials::of(&registration), Status::Ok).await;
        let body: Value = response.into_json().await.unwrap();
        assert!(body["access_token"].as_str().is_some());
        assert_eq!(86400, body["expires_in"]);
        assert_eq!(registration.email, body["admin"]["email"]);
        assert!(body["admin"].get("password_hash").is_none());
    }

    #[backend_test]
    async fn bad_logins_are_indistinguishable(client: Client) {
        let registration = AdminRegistration::example();
        client
            .rocket()
            .state::<AdminService>()
            .unwrap()
            .register(registration.clone())
            .await
            .unwrap();

        // Wrong password.
        let wrong_password = Credentials::of(&registration).with_password("not-the-password");
        let response = login_expect_status(&client, &wrong_password, Status::Unauthorized).await;
        let wrong_password_body = response.into_string().await.unwrap();

        // Unknown email.
        let unknown_email = Credentials {
            email: "nobody@univote.edu".to_string(),
            password: registration.password.clone(),
        };
        let response = login_expect_status(&client, &unknown_email, Status::Unauthorized).await;
        let unknown_email_body = response.into_string().await.unwrap();

        assert_eq!(wrong_password_body, unknown_email_body);
    }

    #[backend_test]
    async fn guarded_routes_need_a_token(client: Client) {
        let response = client.get(uri!(get_admins)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .get(uri!(get_admins))
            .header(bearer("not.a.token"))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .post(uri!(create_admin))
            .header(ContentType::JSON)
            .body(json!(AdminRegistration::example2()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test(admin)]
    async fn create_list_delete_admin(client: Client, auth: Header<'static>, stores: MemoryStores) {
        // Create an admin.
        let created = create_admin_expect_status(
            &client,
            auth.clone(),
            &AdminRegistration::example2(),
            Status::Ok,
        )
        .await;
        let created: PublicAdmin = created.into_json().await.unwrap();
        assert_eq!(AdminRegistration::example2().email, created.email);

        // Both admins are listed.
        let response = client
            .get(uri!(get_admins))
            .header(auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let listed: Vec<PublicAdmin> =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        let emails: Vec<_> = listed.iter().map(|admin| admin.email.as_str()).collect();
        assert_eq!(vec!["alice@univote.edu", "bob@univote.edu"], emails);

        // The new admin can log in.
        login_expect_status(
            &client,
            &Credentials::of(&AdminRegistration::example2()),
            Status::Ok,
        )
        .await;

        // Delete it.
        let response = client
            .delete(uri!(delete_admin(created.id)))
            .header(auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(1, stores.admins.count().await.unwrap());

        let response = client
            .get(uri!(get_admin(created.id)))
            .header(auth)
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn bad_create_admin(client: Client, auth: Header<'static>, stores: MemoryStores) {
        // Short password.
        let mut registration = AdminRegistration::example2();
        registration.password = "abc".to_string();
        create_admin_expect_status(&client, auth.clone(), &registration, Status::BadRequest).await;

        // Malformed email.
        let mut registration = AdminRegistration::example2();
        registration.email = "bob".to_string();
        create_admin_expect_status(&client, auth.clone(), &registration, Status::BadRequest).await;

        // Duplicate email.
        create_admin_expect_status(
            &client,
            auth,
            &AdminRegistration::example(),
            Status::Conflict,
        )
        .await;

        // Ensure no admins were created.
        assert_eq!(1, stores.admins.count().await.unwrap());
    }

    #[backend_test(admin)]
    async fn cannot_delete_last_admin(client: Client, auth: Header<'static>) {
        let token_owner: PublicAdmin = client
            .get(uri!(profile))
            .header(auth.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();

        let response = client
            .delete(uri!(delete_admin(token_owner.id)))
            .header(auth.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        // Still there, and still logged in.
        let response = client.get(uri!(profile)).header(auth).dispatch().await;
        assert_eq!(Status::Ok, response.status());
    }

    #[backend_test(admin)]
    async fn deleted_admin_token_stops_working(client: Client, auth: Header<'static>) {
        let first: PublicAdmin = client
            .get(uri!(profile))
            .header(auth.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();

        // A second admin deletes the first.
        create_admin_expect_status(
            &client,
            auth.clone(),
            &AdminRegistration::example2(),
            Status::Ok,
        )
        .await;
        let response = login_expect_status(
            &client,
            &Credentials::of(&AdminRegistration::example2()),
            Status::Ok,
        )
        .await;
        let body: Value = response.into_json().await.unwrap();
        let second = bearer(body["access_token"].as_str().unwrap());

        let response = client
            .delete(uri!(delete_admin(first.id)))
            .header(second)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        // The first admin's token is still well-signed but names no one.
        let response = client.get(uri!(profile)).header(auth).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test(admin)]
    async fn modify_admin_details(client: Client, auth: Header<'static>) {
        let me: PublicAdmin = client
            .get(uri!(profile))
            .header(auth.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();

        let mut details = me.details.clone();
        details.last_name = "Renamed".to_string();
        let update = AccountUpdate {
            details: Some(details),
            ..Default::default()
        };
        let response = client
            .patch(uri!(modify_admin(me.id)))
            .header(ContentType::JSON)
            .header(auth)
            .body(json!(update).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let modified: PublicAdmin = response.into_json().await.unwrap();
        assert_eq!("Renamed", modified.details.last_name);
        assert_eq!(me.email, modified.email);
    }

    #[backend_test(admin)]
    async fn check_password(client: Client, auth: Header<'static>) {
        let me: PublicAdmin = client
            .get(uri!(profile))
            .header(auth)
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();

        for (password, expected) in [
            (AdminRegistration::example().password, true),
            ("wrong-password".to_string(), false),
        ] {
            let response = client
                .post(uri!(validate_password))
                .header(ContentType::JSON)
                .body(json!({ "adminId": me.id, "password": password }).to_string())
                .dispatch()
                .await;
            assert_eq!(Status::Ok, response.status());
            let result: PasswordCheckResult = response.into_json().await.unwrap();
            assert_eq!(expected, result.valid);
        }

        // Unknown admin.
        let response = client
            .post(uri!(validate_password))
            .header(ContentType::JSON)
            .body(json!({ "id": me.id + 100, "password": "whatever" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    async fn login_expect_status<'c>(
        client: &'c Client,
        credentials: &Credentials,
        status: Status,
    ) -> LocalResponse<'c> {
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(credentials).to_string())
            .dispatch()
            .await;
        assert_eq!(status, response.status());
        response
    }

    async fn create_admin_expect_status<'c>(
        client: &'c Client,
        auth: Header<'static>,
        registration: &AdminRegistration,
        status: Status,
    ) -> LocalResponse<'c> {
        let response = client
            .post(uri!(create_admin))
            .header(ContentType::JSON)
            .header(auth)
            .body(json!(registration).to_string())
            .dispatch()
            .await;
        assert_eq!(status, response.status());
        response
    }
}
