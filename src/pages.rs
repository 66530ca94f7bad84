use crate::error::{log_error, ApiError};
use crate::Tera;
use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
struct Endpoint {
    method: &'static str,
    path: &'static str,
    protected: bool,
    summary: &'static str,
}

const fn endpoint(
    method: &'static str,
    path: &'static str,
    protected: bool,
    summary: &'static str,
) -> Endpoint {
    Endpoint {
        method,
        path,
        protected,
        summary,
    }
}

const ENDPOINTS: &[Endpoint] = &[
    endpoint("POST", "/login", false, "Log in and receive a bearer token"),
    endpoint("POST", "/users", false, "Register a new user"),
    endpoint("GET", "/users", true, "List all users"),
    endpoint("GET", "/users/{username}", true, "Get a user"),
    endpoint("PUT", "/users/{username}", true, "Update your profile"),
    endpoint("DELETE", "/users/{username}", true, "Deregister"),
    endpoint("GET", "/users/{username}/favoriteMovies", true, "List favorite movies"),
    endpoint("POST", "/users/{username}/movies/{movie_id}", true, "Add a favorite"),
    endpoint("DELETE", "/users/{username}/movies/{movie_id}", true, "Remove a favorite"),
    endpoint("GET", "/movies", true, "List all movies"),
    endpoint("GET", "/movies/{title}", true, "Get a movie by title"),
    endpoint("GET", "/movies/genre/{name}", true, "Get a genre by name"),
    endpoint("GET", "/movies/director/{name}", true, "Get a director by name"),
];

fn render(tera: &Tera, template: &str, ctx: &tera::Context) -> Result<HttpResponse, ApiError> {
    let body = tera
        .render(template, ctx)
        .map_err(|err| log_error(err, "Template error"))?;
    Ok(HttpResponse::Ok().content_type("text/html").body(body))
}

pub async fn index(tera: Tera) -> Result<HttpResponse, ApiError> {
    render(&tera, "index.html", &tera::Context::new())
}

pub async fn docs(tera: Tera) -> Result<HttpResponse, ApiError> {
    let mut ctx = tera::Context::new();
    ctx.insert("endpoints", ENDPOINTS);
    render(&tera, "docs.html", &ctx)
}
