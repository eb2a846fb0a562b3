use crate::{
    api::{attendance, student},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

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

    // Swipe gets its own (tighter) budget; a stuck card reader must not be
    // able to hammer the toggle.
    let swipe_limiter = Arc::new(build_limiter(config.rate_swipe_per_min));
    let default_limiter = Arc::new(build_limiter(config.rate_default_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(default_limiter) // rate limiting
            .service(
                web::scope("/students")
                    // /students
                    .service(web::resource("").route(web::get().to(student::list_students)))
                    // /students/add
                    .service(web::resource("/add").route(web::post().to(student::add_student)))
                    // /students/addMany
                    .service(
                        web::resource("/addMany")
                            .route(web::post().to(student::add_many_students)),
                    )
                    // /students/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(student::update_student))
                            .route(web::delete().to(student::delete_student)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    // /attendance/swipe
                    .service(
                        web::resource("/swipe")
                            .wrap(swipe_limiter.clone())
                            .route(web::post().to(attendance::swipe)),
                    )
                    // /attendance/active
                    .service(
                        web::resource("/active")
                            .route(web::get().to(attendance::active_attendance)),
                    )
                    // /attendance/force-out
                    .service(
                        web::resource("/force-out").route(web::put().to(attendance::force_out)),
                    )
                    // /attendance/date/{date}
                    .service(
                        web::resource("/date/{date}")
                            .route(web::get().to(attendance::date_report)),
                    )
                    // /attendance/{id}/clock-out
                    .service(
                        web::resource("/{id}/clock-out")
                            .route(web::put().to(attendance::clock_out)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(attendance::update_attendance)),
                    ),
            ),
    );
}

// SWIPE IN
//  └─ new record, out_time empty
// SWIPE AGAIN
//  └─ same record closed, duration stamped
// MISSED SWIPE-OUT
//  └─ PUT /attendance/force-out at closing time
