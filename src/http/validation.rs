//! Request body and query validation.
//!
//! Every rule runs; all failures are reported together as
//! `400 {error: "Invalid input data", details: [{field, message}]}`.

use serde::{Deserialize, Serialize};

use crate::auth::Registration;
use crate::http::error::ApiError;
use crate::ledger::service::{OperationDraft, MAX_PAGE_SIZE};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

const MIN_PASSWORD_LEN: usize = 6;
const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=50;

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collected failures for one input.
#[derive(Debug, Default)]
struct Checks(Vec<FieldError>);

impl Checks {
    fn require(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.0.push(FieldError::new(field, message));
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOperationBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Validated login credentials: lower-cased e-mail and password.
pub fn validate_login(body: LoginBody) -> Result<(String, String), ApiError> {
    let mut checks = Checks::default();
    let email = normalize_email(&body.email);
    checks.require(is_email(&email), "email", "Valid email is required");
    checks.require(
        body.password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        "Password must be at least 6 characters",
    );
    checks.finish((email, body.password))
}

pub fn validate_registration(body: RegisterBody) -> Result<Registration, ApiError> {
    let mut checks = Checks::default();
    let email = normalize_email(&body.email);
    checks.require(is_email(&email), "email", "Valid email is required");
    checks.require(
        body.password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        "Password must be at least 6 characters",
    );

    let first_name = body.first_name.trim().to_string();
    let last_name = body.last_name.trim().to_string();
    check_name(&mut checks, &first_name, "firstName", "First name");
    check_name(&mut checks, &last_name, "lastName", "Last name");

    checks.finish(Registration {
        email,
        password: body.password,
        first_name,
        last_name,
    })
}

pub fn validate_operation(body: CreateOperationBody) -> Result<OperationDraft, ApiError> {
    let mut checks = Checks::default();
    let kind = body.kind.trim().to_string();
    checks.require(
        kind == "buy" || kind == "sell",
        "type",
        "Type must be \"buy\" or \"sell\"",
    );
    checks.require(
        body.amount.is_finite() && body.amount > 0.0,
        "amount",
        "Amount must be a number greater than 0",
    );

    let currency = body.currency.trim().to_string();
    checks.require(
        is_currency_code(&currency),
        "currency",
        "Currency must be 2 to 10 upper-case letters",
    );

    checks.finish(OperationDraft {
        kind,
        amount: body.amount,
        currency,
    })
}

/// Page and limit with defaults applied.
pub fn validate_list_query(query: ListQuery) -> Result<(u32, u32), ApiError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let mut checks = Checks::default();
    checks.require(page >= 1, "page", "Page must be an integer >= 1");
    checks.require(
        (1..=MAX_PAGE_SIZE).contains(&limit),
        "limit",
        "Limit must be an integer between 1 and 100",
    );
    checks.finish((page, limit))
}

fn check_name(checks: &mut Checks, value: &str, field: &str, label: &str) {
    checks.require(
        NAME_LEN.contains(&value.chars().count()),
        field,
        &format!("{label} must be between 2 and 50 characters"),
    );
    checks.require(
        !value.is_empty() && value.chars().all(is_name_char),
        field,
        &format!("{label} may only contain letters and spaces"),
    );
}

/// ASCII letters, Latin-1 accented letters and whitespace.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{C0}'..='\u{FF}').contains(&c) || c.is_whitespace()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}

fn is_currency_code(code: &str) -> bool {
    (2..=10).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_uppercase())
}
