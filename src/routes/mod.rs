// Route exports
pub mod providers;

use actix_web::web;

pub use providers::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(providers::configure),
    );
}
