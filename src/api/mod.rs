use rocket::Route;

mod admin;
mod candidate;
mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(voter::routes());
    routes.extend(candidate::routes());
    routes
}
