use std::collections::BTreeMap;

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::db::models::{Post, PostFields};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, max = 250, message = "Blog post title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 250, message = "Subtitle is required"))]
    pub subtitle: String,
    #[validate(url(message = "Blog image URL must be a valid URL"))]
    pub img_url: String,
    #[validate(custom(function = "not_blank"))]
    pub body: String,
}

/// Rejects empty and whitespace-only bodies. The body itself is stored
/// untrimmed since it is HTML.
fn not_blank(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Blog content is required".into());
        Err(err)
    } else {
        Ok(())
    }
}

impl PostForm {
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            subtitle: self.subtitle.trim().to_string(),
            img_url: self.img_url.trim().to_string(),
            body: self.body,
        }
    }

    pub fn fields(&self) -> PostFields {
        PostFields {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            body: self.body.clone(),
            img_url: self.img_url.clone(),
        }
    }
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            img_url: post.img_url.clone(),
            body: post.body.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(min = 1, max = 250, message = "Name is required"))]
    pub name: String,
}

impl RegisterForm {
    pub fn trimmed(self) -> Self {
        Self {
            email: self.email.trim().to_string(),
            password: self.password,
            name: self.name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginForm {
    pub fn trimmed(self) -> Self {
        Self {
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "Comment cannot be empty"))]
    pub comment: String,
}

impl CommentForm {
    pub fn trimmed(self) -> Self {
        Self {
            comment: self.comment.trim().to_string(),
        }
    }
}

/// Field name to error messages, for re-rendering a rejected form.
#[derive(Debug, Clone, Default)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                out.add(&field, message);
            }
        }
        out
    }
}

pub fn check<T: Validate>(form: &T) -> Result<(), FormErrors> {
    form.validate().map_err(FormErrors::from)
}
