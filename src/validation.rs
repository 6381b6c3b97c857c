use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, AppResult, FieldError};

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Treats an empty string the same as an absent field.
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Collects every failing field before rejecting a request.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, param: &'static str, msg: &'static str) {
        if !ok {
            self.0.push(FieldError { param, msg });
        }
    }

    /// Fails when the field is missing or empty.
    pub fn require(&mut self, value: Option<&str>, param: &'static str, msg: &'static str) {
        self.check(value.is_some_and(|v| !v.is_empty()), param, msg);
    }

    pub fn finish(self) -> AppResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}
