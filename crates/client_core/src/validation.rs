//! Client-side input checks run before any request leaves the process.
//!
//! Every validator maps raw field strings to a field -> message mapping; an
//! empty mapping means the form may be submitted.

use shared::error::FieldErrors;

use crate::form::FormDraft;

pub const NAME: &str = "name";
pub const EMAIL: &str = "email";
pub const PHONE: &str = "phone";
pub const PASSWORD: &str = "password";
pub const RECEIVER_PHONE: &str = "receiver_phone";
pub const AMOUNT: &str = "amount";
pub const PLAN: &str = "plan_id";

pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 15;
pub const RECIPIENT_MIN_DIGITS: usize = 9;
pub const RECIPIENT_MAX_DIGITS: usize = 15;
pub const PASSWORD_MIN_CHARS: usize = 6;

const PHONE_REQUIRED: &str = "Téléphone est requis";
const PHONE_INVALID: &str = "Numéro invalide";
const PASSWORD_REQUIRED: &str = "Mot de passe requis";
const PASSWORD_TOO_SHORT: &str = "Minimum 6 caractères";
const EMAIL_REQUIRED: &str = "Email est requis";
const EMAIL_INVALID: &str = "Email invalide";
const NAME_REQUIRED: &str = "Le nom est requis";
const RECIPIENT_INVALID: &str = "Numéro du destinataire invalide";
const AMOUNT_INVALID: &str = "Montant invalide";
const PLAN_REQUIRED: &str = "Veuillez choisir un forfait";

fn is_digits_between(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn check_phone(phone: &str) -> Option<&'static str> {
    if phone.trim().is_empty() {
        Some(PHONE_REQUIRED)
    } else if !is_digits_between(phone, PHONE_MIN_DIGITS, PHONE_MAX_DIGITS) {
        Some(PHONE_INVALID)
    } else {
        None
    }
}

pub fn check_password(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some(PASSWORD_REQUIRED)
    } else if password.chars().count() < PASSWORD_MIN_CHARS {
        Some(PASSWORD_TOO_SHORT)
    } else {
        None
    }
}

pub fn check_name(name: &str) -> Option<&'static str> {
    name.trim().is_empty().then_some(NAME_REQUIRED)
}

pub fn check_email(email: &str) -> Option<&'static str> {
    if email.trim().is_empty() {
        Some(EMAIL_REQUIRED)
    } else if !looks_like_email(email) {
        Some(EMAIL_INVALID)
    } else {
        None
    }
}

/// `local@domain.tld`: no whitespace, exactly one `@`, a dot inside the domain.
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |part: &str| {
        !part.is_empty() && !part.contains('@') && !part.contains(char::is_whitespace)
    };
    if !clean(local) || !clean(domain) {
        return false;
    }
    domain
        .char_indices()
        .any(|(idx, c)| c == '.' && idx > 0 && idx + 1 < domain.len())
}

pub fn check_recipient(phone: &str) -> Option<&'static str> {
    (!is_digits_between(phone, RECIPIENT_MIN_DIGITS, RECIPIENT_MAX_DIGITS))
        .then_some(RECIPIENT_INVALID)
}

/// Positive, finite amount.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

pub fn check_amount(raw: &str) -> Option<&'static str> {
    parse_amount(raw).is_none().then_some(AMOUNT_INVALID)
}

fn collect(checks: &[(&str, Option<&'static str>)]) -> FieldErrors {
    checks
        .iter()
        .filter_map(|(field, message)| message.map(|m| (field.to_string(), m.to_string())))
        .collect()
}

pub fn validate_login(form: &FormDraft) -> FieldErrors {
    collect(&[
        (PHONE, check_phone(form.value(PHONE))),
        (PASSWORD, check_password(form.value(PASSWORD))),
    ])
}

pub fn validate_registration(form: &FormDraft) -> FieldErrors {
    collect(&[
        (NAME, check_name(form.value(NAME))),
        (EMAIL, check_email(form.value(EMAIL))),
        (PHONE, check_phone(form.value(PHONE))),
        (PASSWORD, check_password(form.value(PASSWORD))),
    ])
}

pub fn validate_transfer(form: &FormDraft) -> FieldErrors {
    collect(&[
        (RECEIVER_PHONE, check_recipient(form.value(RECEIVER_PHONE))),
        (AMOUNT, check_amount(form.value(AMOUNT))),
    ])
}

pub fn validate_plan_transfer(plan_selected: bool, receiver_phone: &str) -> FieldErrors {
    collect(&[
        (PLAN, (!plan_selected).then_some(PLAN_REQUIRED)),
        (RECEIVER_PHONE, check_recipient(receiver_phone)),
    ])
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
