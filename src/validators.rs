/// Input validators for account data
/// 1. Length limits on every free-text field
/// 2. Email format check (RFC 5322, simplified). Punycode domains (`xn--`)
///    are plain ASCII and pass as-is.
/// 3. Display-name sanitization (control characters, SQL-looking payloads)

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_NAME_LENGTH: usize = 256;
const MAX_EMPLOYEE_ID_LENGTH: usize = 50; // users.employee_id VARCHAR(50)

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref SQL_INJECTION_PATTERNS: [Regex; 4] = [
        Regex::new(r"(?i)\s+UNION\s+").unwrap(),
        Regex::new(r"(--|;|/\*|\*/)").unwrap(),
        Regex::new(r"(?i);\s*(INSERT|UPDATE|DELETE|DROP|CREATE|ALTER)").unwrap(),
        Regex::new(r#"(?i)(\bOR\b|\bAND\b)\s*(['"][0-9]*['"]|[0-9]*)\s*=\s*(['"][0-9]*['"]|[0-9]*|True|False)"#).unwrap(),
    ];

    static ref EMPLOYEE_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap();
}

/// Validates an email address and returns it trimmed.
/// Case is preserved: stored emails are compared case-sensitively.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if let Some(at_pos) = trimmed.find('@') {
        if trimmed[..at_pos].len() > MAX_LOCAL_PART_LENGTH {
            return Err(ValidationError::SuspiciousContent("email".to_string()));
        }
    }

    Ok(trimmed.to_string())
}

/// Validates an optional display name. Blank names are treated as absent.
pub fn is_valid_full_name(name: Option<&str>) -> Result<Option<String>, ValidationError> {
    let trimmed = match name.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(trimmed) => trimmed,
    };

    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("full_name".to_string(), MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("full_name".to_string()));
    }

    let special_char_count = trimmed
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !"-._'".contains(*c))
        .count();
    if special_char_count > 5 {
        return Err(ValidationError::SuspiciousContent("full_name".to_string()));
    }

    if contains_sql_injection_patterns(trimmed) {
        return Err(ValidationError::PossibleSQLInjection);
    }

    Ok(Some(trimmed.to_string()))
}

/// Validates a staff employee id. Missing or blank ids are rejected.
pub fn is_valid_employee_id(employee_id: Option<&str>) -> Result<String, ValidationError> {
    let trimmed = match employee_id.map(str::trim) {
        None | Some("") => return Err(ValidationError::MissingEmployeeId),
        Some(trimmed) => trimmed,
    };

    if trimmed.len() > MAX_EMPLOYEE_ID_LENGTH {
        return Err(ValidationError::TooLong(
            "employee_id".to_string(),
            MAX_EMPLOYEE_ID_LENGTH,
        ));
    }

    if !EMPLOYEE_ID_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("employee_id".to_string()));
    }

    Ok(trimmed.to_string())
}

fn contains_sql_injection_patterns(input: &str) -> bool {
    SQL_INJECTION_PATTERNS.iter().any(|pattern| pattern.is_match(input))
}
