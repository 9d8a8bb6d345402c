use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{error, info, warn};
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    Data, Orbit, Request, Response, Rocket,
};

use crate::model::{
    auth::AUTHORIZATION_HEADER,
    principal::{PrincipalId, Role},
};

/// Sequence number of a request, used to pair request and response lines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Wraps around to zero on overflow.
    pub fn next() -> RequestId {
        static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// The principal a request's guard admitted, if any. Cached on the request
/// so the response can be attributed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal(pub Option<(Role, PrincipalId)>);

impl Principal {
    /// Record that `id` of kind `role` was admitted for this request.
    pub fn record(req: &Request<'_>, role: Role, id: PrincipalId) {
        req.local_cache(|| Principal(Some((role, id))));
    }

    fn of(req: &Request<'_>) -> Self {
        *req.local_cache(|| Principal(None))
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some((role, id)) => write!(f, " as {role} {id}"),
            None => Ok(()),
        }
    }
}

/// Logs each request and response. Bearer tokens are never logged; requests
/// are only tagged with whether one was sent, and responses with the
/// principal it resolved to.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Request logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let config = rocket.config();
        let scheme = if config.tls_enabled() {
            "https"
        } else {
            "http"
        };
        let (address, port) = (config.address, config.port);
        info!("UniVote backend listening on {scheme}://{address}:{port}");
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let id = req.local_cache(RequestId::next);
        let bearer = if req.headers().contains(AUTHORIZATION_HEADER) {
            " [bearer]"
        } else {
            ""
        };
        info!("->req{id} {} {}{bearer}", req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = req.local_cache(RequestId::next);
        let status = res.status();
        let route = req
            .route()
            .map(|route| match route.name {
                Some(ref name) => format!("{name} ({})", route.uri),
                None => route.uri.to_string(),
            })
            .unwrap_or_else(|| "no route".to_string());
        let principal = Principal::of(req);

        let line = format!("<-rsp{id} {status} {route}{principal}");
        match status.class() {
            StatusClass::ServerError => error!("{line}"),
            StatusClass::ClientError => warn!("{line}"),
            _ => info!("{line}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, draining connections");
    }
}
