use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub birthdate: NaiveDate,
    pub favorite_movies: BTreeSet<u64>,
}

/// What clients get to see of a user. The password hash stays server-side.
#[derive(Serialize, Debug)]
pub struct UserView<'a> {
    #[serde(rename = "_id")]
    pub id: u64,
    pub username: &'a str,
    pub email: &'a str,
    pub birthdate: NaiveDate,
    #[serde(rename = "favoriteMovies")]
    pub favorite_movies: &'a BTreeSet<u64>,
}

impl User {
    pub fn view(&self, id: u64) -> UserView<'_> {
        UserView {
            id,
            username: &self.username,
            email: &self.email,
            birthdate: self.birthdate,
            favorite_movies: &self.favorite_movies,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Genre {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Director {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Bio")]
    pub bio: String,
}

// Stored with bincode, so no skip_serializing_if here: every field must
// always be written.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Movie {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Synopsis")]
    pub synopsis: String,
    #[serde(rename = "Genre", default)]
    pub genre: Genre,
    #[serde(rename = "Director", default)]
    pub director: Director,
    #[serde(rename = "Actors", default)]
    pub actors: Vec<String>,
    #[serde(rename = "imagePath", default)]
    pub image_path: Option<String>,
    #[serde(rename = "Featured", default)]
    pub featured: bool,
}

#[derive(Serialize, Debug)]
pub struct MovieView<'a> {
    #[serde(rename = "_id")]
    pub id: u64,
    #[serde(flatten)]
    pub movie: &'a Movie,
}

impl Movie {
    pub fn view(&self, id: u64) -> MovieView<'_> {
        MovieView { id, movie: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_view_hides_password_hash() {
        let user = User {
            username: "alice1".to_owned(),
            password_hash: "$2b$10$secret".to_owned(),
            email: "a@x.com".to_owned(),
            birthdate: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            favorite_movies: vec![3, 1].into_iter().collect(),
        };
        let json = serde_json::to_value(user.view(7)).unwrap();
        assert_eq!(json["_id"], 7);
        assert_eq!(json["username"], "alice1");
        assert_eq!(json["birthdate"], "1990-01-01");
        assert_eq!(json["favoriteMovies"], serde_json::json!([1, 3]));
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("secret"));
    }

    #[test]
    fn movie_document_defaults() {
        let movie: Movie = serde_json::from_str(
            r#"{"Title": "Heat", "Synopsis": "Cops and robbers.", "Actors": ["Al Pacino"]}"#,
        )
        .unwrap();
        assert_eq!(movie.title, "Heat");
        assert_eq!(movie.image_path, None);
        assert!(!movie.featured);
        assert_eq!(movie.genre, Genre::default());

        let json = serde_json::to_value(movie.view(2)).unwrap();
        assert_eq!(json["_id"], 2);
        assert_eq!(json["Title"], "Heat");
        assert_eq!(json["Actors"][0], "Al Pacino");
    }
}
