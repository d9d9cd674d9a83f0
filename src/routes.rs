use crate::{
    api::{attendance, project},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{guard, web};
use anyhow::anyhow;
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Limiters shared by every worker, built once at start-up.
#[derive(Clone)]
pub struct RateLimiters {
    mutations: Limiter,
    reads: Limiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            mutations: Arc::new(build_limiter(config.rate_mutations_per_min)?),
            reads: Arc::new(build_limiter(config.rate_reads_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> anyhow::Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests per minute"))?;

    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .wrap(limiters.reads.clone())
                            .route(web::get().to(attendance::list_sessions)),
                    )
                    // /attendance/check-in
                    .service(
                        web::resource("/check-in")
                            .wrap(limiters.mutations.clone())
                            .route(web::post().to(attendance::check_in)),
                    )
                    // /attendance/check-out
                    .service(
                        web::resource("/check-out")
                            .wrap(limiters.mutations.clone())
                            .route(web::post().to(attendance::check_out)),
                    ),
            )
            .service(
                web::scope("/projects")
                    // GET /projects
                    .service(
                        web::resource("")
                            .guard(guard::Get())
                            .wrap(limiters.reads.clone())
                            .route(web::get().to(project::list_projects)),
                    )
                    // POST /projects
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .wrap(limiters.mutations.clone())
                            .route(web::post().to(project::add_project)),
                    ),
            ),
    );
}
