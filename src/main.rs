use storefront_orders::{build_server, create_pool, run_migrations, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let pool = create_pool(&config.database_url, config.db_pool_size)
        .map_err(std::io::Error::other)?;
    run_migrations(&pool).map_err(std::io::Error::other)?;

    if config.vnpay.tmn_code.is_empty() || config.vnpay.hash_secret.is_empty() {
        log::warn!("VNPAY_TMN_CODE / VNPAY_HASH_SECRET not set; VNPay checkout will be rejected by the gateway");
    }
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(pool, &config)?.await
}
