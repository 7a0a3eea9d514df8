use actix_web::{
    middleware,
    web::{self, Data},
    App, HttpServer,
};
use log::info;

use perfumery::{config::Config, db, init_pool, routes, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env()?;
    let db_pool = init_pool(&config.database_url).await?;
    let state = AppState::new(db_pool, config.clone());

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        db::seed_admin(&state, email, password).await?;
    }

    info!(
        "Starting HTTP server on http://{}:{}/",
        config.host, config.port
    );

    HttpServer::new(move || {
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .app_data(Data::new(state.clone()))
            .configure(routes::configure)
            .default_service(web::to(routes::default_handler))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
