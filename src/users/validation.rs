use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::model::{attribute_label, User};
use super::repo::{UserField, UserStore};

pub const USERNAME_MAX: usize = 255;
pub const EMAIL_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 5;
pub const PASSWORD_MAX: usize = 32;
/// Width of an Argon2id PHC string with default parameters, with headroom.
pub const ENCRYPTED_PASSWORD_MAX: usize = 128;

/// Which operation is validating; selects the required-field rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Create,
    Update,
    Default,
}

impl Scenario {
    fn required(self) -> &'static [&'static str] {
        match self {
            Scenario::Create => &["username", "email", "password"],
            Scenario::Update => &["username", "email"],
            Scenario::Default => &[],
        }
    }
}

/// Field name to messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn taken(field: UserField, value: &str) -> Self {
        let mut errors = Self::default();
        let attr = field.column();
        errors.add(
            attr,
            format!("{} \"{}\" has already been taken.", attribute_label(attr), value),
        );
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for m in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {m}")?;
                first = false;
            }
        }
        Ok(())
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(
            r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?$"
        )
        .unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_length(
    errors: &mut ValidationErrors,
    attr: &str,
    value: &str,
    min: Option<usize>,
    max: usize,
) {
    if value.is_empty() || errors.has(attr) {
        return;
    }
    let len = value.chars().count();
    let label = attribute_label(attr);
    if let Some(min) = min {
        if len < min {
            errors.add(attr, format!("{label} should contain at least {min} characters."));
            return;
        }
    }
    if len > max {
        errors.add(attr, format!("{label} should contain at most {max} characters."));
    }
}

/// Required and length rules; needs no store.
pub fn check_fields(user: &User, scenario: Scenario) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    let password = user.password.as_deref().unwrap_or("");

    for &attr in scenario.required() {
        let blank = match attr {
            "username" => user.username.is_empty(),
            "email" => user.email.is_empty(),
            "password" => password.is_empty(),
            _ => false,
        };
        if blank {
            errors.add(attr, format!("{} cannot be blank.", attribute_label(attr)));
        }
    }

    check_length(&mut errors, "username", &user.username, None, USERNAME_MAX);
    check_length(&mut errors, "email", &user.email, None, EMAIL_MAX);
    check_length(&mut errors, "password", password, Some(PASSWORD_MIN), PASSWORD_MAX);
    check_length(
        &mut errors,
        "encrypted_password",
        &user.encrypted_password,
        None,
        ENCRYPTED_PASSWORD_MAX,
    );
    errors
}

/// Full rule set: required, lengths, uniqueness against `store`, email syntax.
///
/// A rule is skipped for an attribute that already failed an earlier one.
pub async fn validate(
    store: &dyn UserStore,
    user: &User,
    scenario: Scenario,
) -> anyhow::Result<ValidationErrors> {
    let mut errors = check_fields(user, scenario);

    for (field, value) in [
        (UserField::Email, user.email.as_str()),
        (UserField::Username, user.username.as_str()),
    ] {
        let attr = field.column();
        if value.is_empty() || errors.has(attr) {
            continue;
        }
        if let Some(existing) = store.find_by_field(field, value).await? {
            if user.is_new || existing.id != user.id {
                errors.add(
                    attr,
                    format!("{} \"{}\" has already been taken.", attribute_label(attr), value),
                );
            }
        }
    }

    if !user.email.is_empty() && !errors.has("email") && !is_valid_email(&user.email) {
        errors.add("email", "Email is not a valid email address.");
    }

    Ok(errors)
}
