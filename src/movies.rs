use crate::database::MovieDb;
use crate::error::ApiError;
use crate::Db;
use actix_web::{web, HttpResponse};

pub async fn list_movies(db: Db) -> Result<HttpResponse, ApiError> {
    let movies = web::block(move || db.list_movies()).await??;
    let views: Vec<_> = movies.iter().map(|(id, movie)| movie.view(*id)).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn movie_by_title(path: web::Path<String>, db: Db) -> Result<HttpResponse, ApiError> {
    let title = path.into_inner();
    let (id, movie) = web::block(move || db.find_movie(|movie| movie.title == title))
        .await??
        .ok_or(ApiError::NotFound("Movie"))?;
    Ok(HttpResponse::Ok().json(movie.view(id)))
}

pub async fn genre(path: web::Path<String>, db: Db) -> Result<HttpResponse, ApiError> {
    let name = path.into_inner();
    let (_, movie) = web::block(move || db.find_movie(|movie| movie.genre.name == name))
        .await??
        .ok_or(ApiError::NotFound("Genre"))?;
    Ok(HttpResponse::Ok().json(movie.genre))
}

pub async fn director(path: web::Path<String>, db: Db) -> Result<HttpResponse, ApiError> {
    let name = path.into_inner();
    let (_, movie) = web::block(move || db.find_movie(|movie| movie.director.name == name))
        .await??
        .ok_or(ApiError::NotFound("Director"))?;
    Ok(HttpResponse::Ok().json(movie.director))
}

#[cfg(test)]
mod tests {
    use crate::database::tests::{movie, temporary_db};
    use crate::database::MovieDb;
    use crate::testing::{bearer, keys, register_user, test_app};
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    #[actix_rt::test]
    async fn catalog_lookups() {
        let db = temporary_db();
        let (_, token) = register_user(&db, "alice1", "Secr3t!");
        let heat = db.add_movie(&movie("Heat", "Crime", "Michael Mann")).unwrap();
        db.add_movie(&movie("Alien", "Horror", "Ridley Scott")).unwrap();
        let app = test_app!(db, keys());

        let req = test::TestRequest::get()
            .uri("/movies")
            .insert_header(bearer(&token))
            .to_request();
        let movies: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(movies.as_array().unwrap().len(), 2);

        let req = test::TestRequest::get()
            .uri("/movies/Heat")
            .insert_header(bearer(&token))
            .to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found["_id"], heat);
        assert_eq!(found["Director"]["Name"], "Michael Mann");

        let req = test::TestRequest::get()
            .uri("/movies/genre/Horror")
            .insert_header(bearer(&token))
            .to_request();
        let genre: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(genre["Name"], "Horror");
        assert_eq!(genre["Description"], "Horror films");

        let req = test::TestRequest::get()
            .uri("/movies/director/Ridley%20Scott")
            .insert_header(bearer(&token))
            .to_request();
        let director: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(director["Bio"], "Ridley Scott directs films.");
    }

    #[actix_rt::test]
    async fn misses_are_not_found() {
        let db = temporary_db();
        let (_, token) = register_user(&db, "alice1", "Secr3t!");
        let app = test_app!(db, keys());

        for uri in ["/movies/Jaws", "/movies/genre/Western", "/movies/director/Nobody"] {
            let req = test::TestRequest::get()
                .uri(uri)
                .insert_header(bearer(&token))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[actix_rt::test]
    async fn catalog_needs_a_token() {
        let db = temporary_db();
        let app = test_app!(db, keys());
        let req = test::TestRequest::get().uri("/movies").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
