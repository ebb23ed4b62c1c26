use actix_web::{web, App, HttpServer};
use crypto_core::jwt as core_jwt;
use social_api::{config, db, error::AppError, logging, routes, state::AppState};

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();
    let cfg = config::Config::from_env()?;

    let pool = db::init_pool()
        .await
        .map_err(|e| AppError::StartServer(format!("db: {e}")))?;

    // The schema must be in sync before serving
    db::run_migrations(&pool)
        .await
        .map_err(|e| AppError::StartServer(format!("database migrations failed: {e}")))?;

    core_jwt::initialize_jwt_keys(&cfg.jwt_private_key_pem, &cfg.jwt_public_key_pem)
        .map_err(|e| AppError::StartServer(format!("init jwt: {e}")))?;

    tracing::info!(
        avatar_base_path = %cfg.settings.avatar_base_path,
        delete_policy = ?cfg.settings.delete_policy,
        user_page_size = cfg.settings.user_page_size,
        "service settings"
    );

    let state = AppState::postgres(pool, &cfg.settings);

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting social-api");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure_routes)
            .wrap(actix_middleware::Logging)
            .wrap(actix_middleware::MetricsMiddleware)
            .wrap(actix_middleware::CorrelationIdMiddleware)
    })
    .bind(&bind_addr)
    .map_err(|e| AppError::StartServer(e.to_string()))?
    .run()
    .await
    .map_err(|e| AppError::StartServer(e.to_string()))?;

    Ok(())
}
