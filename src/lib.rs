pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;
pub mod state;

use actix_web::{error, middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use auth::{JwtKeys, Role};
pub use config::AppConfig;
pub use db::{create_pool, DbPool};
pub use state::AppState;

use crate::errors::AppError;
use crate::handlers::{admin_orders, cart, checkout, coupons, orders};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    let mut conn = pool
        .get()
        .map_err(|e| AppError::Internal(format!("migration connection: {e}")))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| AppError::Internal(format!("migrations failed: {e}")))?;
    Ok(())
}

/// Registers the extractor error handlers and every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .service(
        web::scope("/api")
            .service(
                web::resource("/cart")
                    .route(web::get().to(cart::list_cart))
                    .route(web::post().to(cart::add_to_cart))
                    .route(web::delete().to(cart::clear_cart)),
            )
            .service(
                web::resource("/cart/{line_id}")
                    .route(web::put().to(cart::update_cart_line))
                    .route(web::delete().to(cart::remove_cart_line)),
            )
            .route("/coupons/apply", web::post().to(coupons::apply_coupon))
            .route("/checkout", web::post().to(checkout::checkout))
            .route("/checkout_vnpay", web::post().to(checkout::checkout_vnpay))
            .service(
                web::resource("/return_checkout_vnpay")
                    .route(web::post().to(checkout::return_checkout_vnpay))
                    .route(web::get().to(checkout::return_checkout_vnpay)),
            )
            .route("/orders/list", web::get().to(orders::list_orders))
            .route("/orders/detail/{id}", web::get().to(orders::order_detail))
            .service(
                web::resource("/orders/cancel/{id}")
                    .route(web::post().to(orders::cancel_order))
                    .route(web::get().to(orders::cancel_order_compat)),
            )
            .service(
                web::scope("/admin/orders")
                    .route("/update/{id}", web::put().to(admin_orders::update_status))
                    .route("/list", web::get().to(admin_orders::list_orders))
                    .route("/detail/{id}", web::get().to(admin_orders::order_detail)),
            ),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    config: &AppConfig,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(AppState::new(pool, config));
    let keys = web::Data::new(JwtKeys::new(&config.jwt_secret));
    let openapi = openapi::ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(keys.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
