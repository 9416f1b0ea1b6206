//! Field validators for raw request input.
//!
//! Each validator is a pure function from a raw string to a [`Checked`] value:
//! the parsed value (or its zero value on failure) plus the validation errors
//! it produced. Handlers run several validators and merge the errors into a
//! single list for the response envelope.

use chrono::NaiveDate;
use std::net::IpAddr;
use validator::ValidationError;

/// Default date layout for request fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const TRUTHY: [&str; 7] = ["true", "1", "yes", "si", "sí", "verdadero", "on"];
const FALSY: [&str; 5] = ["false", "0", "no", "falso", "off"];

/// Outcome of validating a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct Checked<T> {
    pub value: T,
    pub errors: Vec<String>,
}

impl<T> Checked<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    pub fn failed(value: T, message: impl Into<String>) -> Self {
        Self {
            value,
            errors: vec![message.into()],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Moves this field's errors into `errors` and returns the value.
    pub fn collect_into(self, errors: &mut Vec<String>) -> T {
        errors.extend(self.errors);
        self.value
    }
}

/// Trimmed non-empty string.
pub fn required_text(raw: &str, message: &str) -> Checked<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Checked::failed(String::new(), message)
    } else {
        Checked::ok(trimmed.to_string())
    }
}

/// Trimmed string; never fails.
pub fn optional_text(raw: &str) -> Checked<String> {
    Checked::ok(raw.trim().to_string())
}

/// Required integer. A parse failure reports the parser's reason after `message`.
pub fn integer(raw: &str, message: &str) -> Checked<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Checked::failed(0, message);
    }

    match trimmed.parse::<i64>() {
        Ok(value) => Checked::ok(value),
        Err(e) => Checked::failed(0, format!("{}: {}", message, e)),
    }
}

/// Integer that may be left blank.
pub fn optional_integer(raw: &str, message: &str) -> Checked<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Checked::ok(None);
    }

    match trimmed.parse::<i64>() {
        Ok(value) => Checked::ok(Some(value)),
        Err(_) => Checked::failed(None, message),
    }
}

/// Calendar date in `YYYY-MM-DD`.
pub fn date(raw: &str, message: &str) -> Checked<Option<NaiveDate>> {
    date_with_format(raw, DATE_FORMAT, message)
}

/// Calendar date in a caller-supplied `chrono` format.
fn date_with_format(raw: &str, format: &str, message: &str) -> Checked<Option<NaiveDate>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Checked::failed(None, message);
    }

    match NaiveDate::parse_from_str(trimmed, format) {
        Ok(value) => Checked::ok(Some(value)),
        Err(_) => Checked::failed(None, message),
    }
}

/// Boolean accepting English and Spanish words, case-insensitive. Blank means `false`.
pub fn optional_boolean(raw: &str, message: &str) -> Checked<bool> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return Checked::ok(false);
    }
    parse_bool(&normalized, message)
}

fn parse_bool(normalized: &str, message: &str) -> Checked<bool> {
    if TRUTHY.contains(&normalized) {
        Checked::ok(true)
    } else if FALSY.contains(&normalized) {
        Checked::ok(false)
    } else {
        Checked::failed(false, message)
    }
}

/// Integer within `min..=max`. The range is only checked after a successful parse.
pub fn integer_in_range(raw: &str, message: &str, min: i64, max: i64) -> Checked<i64> {
    let parsed = integer(raw, message);
    if !parsed.is_ok() {
        return parsed;
    }

    if (min..=max).contains(&parsed.value) {
        parsed
    } else {
        Checked::failed(0, format!("{}. Debe estar entre {} y {}", message, min, max))
    }
}

/// `validator` hook: an IPv4 address or an RFC 1123 host name.
///
/// IPv6 literals are refused: their colons collide with the `host,port`
/// and `host:port` forms of the connection strings.
pub fn validate_host(host: &str) -> Result<(), ValidationError> {
    if matches!(host.parse::<IpAddr>(), Ok(IpAddr::V4(_))) || is_hostname(host) {
        Ok(())
    } else {
        let mut err = ValidationError::new("host");
        err.message = Some("host debe ser un nombre de host o una dirección IPv4 válida".into());
        Err(err)
    }
}

fn is_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("  abc ", "req").value, "abc");

        let blank = required_text("   ", "El campo es requerido");
        assert_eq!(blank.value, "");
        assert_eq!(blank.errors, vec!["El campo es requerido".to_string()]);
    }

    #[test]
    fn integer_reports_message_for_blank_and_reason_for_garbage() {
        assert_eq!(integer("42", "n").value, 42);
        assert_eq!(integer("", "idServer requerido").errors, vec!["idServer requerido"]);

        let garbage = integer("4x", "idServer inválido");
        assert_eq!(garbage.value, 0);
        assert_eq!(garbage.errors.len(), 1);
        assert!(garbage.errors[0].starts_with("idServer inválido: "));
    }

    #[test]
    fn optional_integer_allows_blank() {
        assert_eq!(optional_integer("  ", "n"), Checked::ok(None));
        assert_eq!(optional_integer("7", "n").value, Some(7));
        assert_eq!(optional_integer("siete", "n debe ser numérico").errors, vec![
            "n debe ser numérico"
        ]);
    }

    #[test]
    fn dates_use_iso_layout_by_default() {
        assert_eq!(
            date("2024-01-31", "fecha").value,
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert!(!date("31/01/2024", "fecha").is_ok());
        assert!(!date("", "fecha").is_ok());
        assert_eq!(
            date_with_format("31/01/2024", "%d/%m/%Y", "fecha").value,
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
    }

    #[test]
    fn booleans_accept_spanish_and_english_words() {
        for word in ["true", "SI", "Sí", "verdadero", "on", "1"] {
            assert!(optional_boolean(word, "b").value, "{} should be true", word);
        }
        for word in ["false", "No", "falso", "off", "0"] {
            let checked = optional_boolean(word, "b");
            assert!(checked.is_ok() && !checked.value, "{} should be false", word);
        }
        assert!(!optional_boolean("maybe", "b").is_ok());
        assert_eq!(optional_boolean("", "b"), Checked::ok(false));
    }

    #[test]
    fn range_checks_run_only_after_parse_succeeds() {
        assert_eq!(integer_in_range("5", "n", 1, 10).value, 5);

        let out_of_range = integer_in_range("11", "Puerto inválido", 1, 10);
        assert_eq!(
            out_of_range.errors,
            vec!["Puerto inválido. Debe estar entre 1 y 10"]
        );

        let blank = integer_in_range("", "Puerto inválido", 1, 10);
        assert_eq!(blank.errors, vec!["Puerto inválido"]);
    }

    #[test]
    fn collect_into_merges_errors() {
        let mut errors = Vec::new();
        let id = integer("", "a").collect_into(&mut errors);
        let name = required_text("x", "b").collect_into(&mut errors);
        let day = date("nope", "c").collect_into(&mut errors);

        assert_eq!(id, 0);
        assert_eq!(name, "x");
        assert_eq!(day, None);
        assert_eq!(errors, vec!["a", "c"]);
    }

    #[test]
    fn hosts_accept_names_and_addresses() {
        assert!(validate_host("localhost").is_ok());
        assert!(validate_host("sql-01.corp.example").is_ok());
        assert!(validate_host("192.168.1.10").is_ok());
        assert!(validate_host("bad host").is_err());
        assert!(validate_host("-edge.example").is_err());
        assert!(validate_host("").is_err());
    }

    #[test]
    fn hosts_refuse_ipv6_literals() {
        for host in ["::1", "fe80::1", "2001:db8::10", "[::1]"] {
            let err = validate_host(host).unwrap_err();
            assert_eq!(err.code, "host");
        }
    }
}
