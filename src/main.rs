mod auth;
mod config;
mod database;
mod error;
mod middleware;
mod model;
mod movies;
mod pages;
mod session;
mod users;
mod validation;

#[cfg(test)]
mod testing;

use actix_web::{guard, middleware::from_fn, middleware::Logger, web, App, HttpServer};
use auth::{TokenKeys, TOKEN_LIFETIME};
use config::Config;
use error::ApiError;
use log::info;
use model::Movie;
use std::io;
use std::path::Path;
use validation::FieldError;

type Tera = web::Data<tera::Tera>;
type Db = web::Data<sled::Db>;
type Keys = web::Data<TokenKeys>;

fn load_templates() -> Result<tera::Tera, tera::Error> {
    tera::Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*"))
}

fn seed_catalog(db: &sled::Db, path: &Path) -> io::Result<()> {
    let raw = std::fs::read(path)?;
    let movies: Vec<Movie> = serde_json::from_slice(&raw)?;
    let inserted = database::seed_movies(db, &movies)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    info!("seeded {} movies from {}", inserted, path.display());
    Ok(())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::Validation(vec![FieldError::new("body", err.to_string())]).into()
    }))
    .route("/", web::get().to(pages::index))
    .route("/docs", web::get().to(pages::docs))
    .route("/login", web::post().to(session::login))
    .service(
        web::resource("/users")
            .guard(guard::Post())
            .to(users::register),
    )
    .service(
        web::scope("/users")
            .wrap(from_fn(middleware::require_bearer))
            .route("", web::get().to(users::list_users))
            .service(
                web::resource("/{username}")
                    .route(web::get().to(users::get_user))
                    .route(web::put().to(users::update_user))
                    .route(web::delete().to(users::delete_user)),
            )
            .route(
                "/{username}/favoriteMovies",
                web::get().to(users::favorite_movies),
            )
            .service(
                web::resource("/{username}/movies/{movie_id}")
                    .route(web::post().to(users::add_favorite))
                    .route(web::delete().to(users::remove_favorite)),
            ),
    )
    .service(
        web::scope("/movies")
            .wrap(from_fn(middleware::require_bearer))
            .route("", web::get().to(movies::list_movies))
            .route("/genre/{name}", web::get().to(movies::genre))
            .route("/director/{name}", web::get().to(movies::director))
            .route("/{title}", web::get().to(movies::movie_by_title)),
    );
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("cinevault=info,actix_web=info"),
    )
    .init();

    let config =
        Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let db = sled::open(&config.database_path)?;
    if let Some(seed) = &config.movies_seed {
        seed_catalog(&db, seed)?;
    }
    let tera = load_templates().map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let db = web::Data::new(db);
    let keys = web::Data::new(TokenKeys::from_secret(
        config.jwt_secret.as_bytes(),
        TOKEN_LIFETIME,
    ));
    let tera = web::Data::new(tera);

    info!(
        "serving {} on {}:{}",
        config.database_path.display(),
        config.bind_address,
        config.port
    );
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(keys.clone())
            .app_data(tera.clone())
            .configure(configure)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
