use crate::{api::dtr, auth::middleware::auth_middleware, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let read_limiter = build_limiter(config.rate_read_per_min);
    let write_limiter = build_limiter(config.rate_write_per_min);

    // Everything lives behind the auth middleware; token issuance is the
    // identity service's job. Writes pass the tighter limiter on top of
    // the scope-wide one.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .service(
                web::scope("/dtr")
                    .wrap(read_limiter)
                    // /dtr
                    .service(
                        web::resource("")
                            .wrap(write_limiter)
                            .route(web::get().to(dtr::list_dtr))
                            .route(web::post().to(dtr::create_dtr))
                            .route(web::put().to(dtr::update_dtr)),
                    )
                    // /dtr/calendar
                    .service(
                        web::resource("/calendar").route(web::get().to(dtr::calendar_dtr)),
                    )
                    // /dtr/summary
                    .service(
                        web::resource("/summary").route(web::get().to(dtr::summary_dtr)),
                    ),
            ),
    );
}
