use serde::Deserialize;

/// Body of `POST /users`. `name` is accepted as an alias of `username`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUser {
    #[serde(alias = "name")]
    pub username: String,
    pub email: String,
    pub password: Option<String>,
}

/// Body of `PUT /users/:id`. Omitting `password` keeps the current one.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUser {
    #[serde(alias = "name")]
    pub username: String,
    pub email: String,
    pub password: Option<String>,
}
