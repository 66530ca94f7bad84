use crate::auth::{self, Identity};
use crate::database::{MovieDb, UserDb};
use crate::error::{log_error, ApiError};
use crate::model::{Movie, User};
use crate::session::{mint_token, AuthResponse};
use crate::validation::{ProfileUpdate, Registration};
use crate::{Db, Keys};
use actix_web::{web, HttpResponse};
use log::info;

fn hash(password: &str) -> Result<String, ApiError> {
    auth::hash_password(password).map_err(|err| log_error(err, "Hashing error"))
}

pub async fn register(
    body: web::Json<Registration>,
    db: Db,
    keys: Keys,
) -> Result<HttpResponse, ApiError> {
    let new_user = body.into_inner().validate()?;
    let (id, user) = web::block(move || -> Result<(u64, User), ApiError> {
        let user = User {
            username: new_user.username,
            password_hash: hash(&new_user.password)?,
            email: new_user.email,
            birthdate: new_user.birthdate,
            favorite_movies: Default::default(),
        };
        let id = db.add_user(&user)?;
        Ok((id, user))
    })
    .await??;
    let token = mint_token(&keys, id, &user.username)?;
    info!("registered {}", user.username);
    Ok(HttpResponse::Created().json(AuthResponse {
        user: user.view(id),
        token,
    }))
}

pub async fn list_users(db: Db) -> Result<HttpResponse, ApiError> {
    let users = web::block(move || db.list_users()).await??;
    let views: Vec<_> = users.iter().map(|(id, user)| user.view(*id)).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn get_user(path: web::Path<String>, db: Db) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    let (id, user) = web::block(move || db.get_user_by_username(&username))
        .await??
        .ok_or(ApiError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(user.view(id)))
}

pub async fn update_user(
    path: web::Path<String>,
    identity: web::ReqData<Identity>,
    body: web::Json<ProfileUpdate>,
    db: Db,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    let owner = identity.user_id;
    let changes = body.into_inner().validate()?;
    let (id, user) = web::block(move || -> Result<Option<(u64, User)>, ApiError> {
        let password_hash = changes.password.as_deref().map(hash).transpose()?;
        let updated = db.update_user(&username, owner, |user| {
            if let Some(new_name) = &changes.username {
                user.username = new_name.clone();
            }
            if let Some(password_hash) = &password_hash {
                user.password_hash = password_hash.clone();
            }
            if let Some(email) = &changes.email {
                user.email = email.clone();
            }
            if let Some(birthdate) = changes.birthdate {
                user.birthdate = birthdate;
            }
        })?;
        Ok(updated)
    })
    .await??
    .ok_or(ApiError::NotFound("User"))?;
    info!("updated {}", user.username);
    Ok(HttpResponse::Ok().json(user.view(id)))
}

pub async fn delete_user(
    path: web::Path<String>,
    identity: web::ReqData<Identity>,
    db: Db,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    let owner = identity.user_id;
    let name = username.clone();
    web::block(move || db.remove_user(&name, owner))
        .await??
        .ok_or(ApiError::NotFound("User"))?;
    info!("deleted {}", username);
    Ok(HttpResponse::Ok().body(format!("{} was deleted.", username)))
}

pub async fn favorite_movies(path: web::Path<String>, db: Db) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    let movies = web::block(move || -> Result<Option<Vec<(u64, Movie)>>, ApiError> {
        let (_, user) = match db.get_user_by_username(&username)? {
            Some(found) => found,
            None => return Ok(None),
        };
        let mut movies = Vec::with_capacity(user.favorite_movies.len());
        for id in user.favorite_movies {
            // Favorites may outlive the movie they point at.
            if let Some(movie) = db.get_movie(id)? {
                movies.push((id, movie));
            }
        }
        Ok(Some(movies))
    })
    .await??
    .ok_or(ApiError::NotFound("User"))?;
    let views: Vec<_> = movies.iter().map(|(id, movie)| movie.view(*id)).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn add_favorite(
    path: web::Path<(String, u64)>,
    identity: web::ReqData<Identity>,
    db: Db,
) -> Result<HttpResponse, ApiError> {
    let (username, movie_id) = path.into_inner();
    let owner = identity.user_id;
    let (id, user) = web::block(move || -> Result<(u64, User), ApiError> {
        if db.get_movie(movie_id)?.is_none() {
            return Err(ApiError::NotFound("Movie"));
        }
        db.update_user(&username, owner, |user| {
            user.favorite_movies.insert(movie_id);
        })?
        .ok_or(ApiError::NotFound("User"))
    })
    .await??;
    Ok(HttpResponse::Ok().json(user.view(id)))
}

pub async fn remove_favorite(
    path: web::Path<(String, u64)>,
    identity: web::ReqData<Identity>,
    db: Db,
) -> Result<HttpResponse, ApiError> {
    let (username, movie_id) = path.into_inner();
    let owner = identity.user_id;
    let (id, user) = web::block(move || {
        db.update_user(&username, owner, |user| {
            user.favorite_movies.remove(&movie_id);
        })
    })
    .await??
    .ok_or(ApiError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(user.view(id)))
}
