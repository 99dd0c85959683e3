//! Field validators shared by every form in the app.
//!
//! Validators are pure functions returning the message to toast on
//! failure. Numeric fields follow the "empty string means absent" rule:
//! an empty entry is not an error, a non-numeric or non-positive one is.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub fn require_text(field: &'static str, label: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, format!("{} requis", label)))
    } else {
        Ok(())
    }
}

pub fn require_min_len(
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min {
        Err(ValidationError::new(
            field,
            format!("{} : {} caractères minimum", label, min),
        ))
    } else {
        Ok(())
    }
}

pub fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let v = value.trim();
    let well_formed = v
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new(field, "Adresse e-mail invalide"))
    }
}

/// Dates travel as ISO `YYYY-MM-DD` strings.
pub fn parse_date(field: &'static str, label: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, format!("{} : date invalide (AAAA-MM-JJ)", label)))
}

pub fn parse_optional_date(
    field: &'static str,
    label: &str,
    value: &str,
) -> Result<Option<NaiveDate>, ValidationError> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(field, label, value).map(Some)
    }
}

pub fn require_date_order(
    field: &'static str,
    debut: NaiveDate,
    fin: NaiveDate,
) -> Result<(), ValidationError> {
    if fin < debut {
        Err(ValidationError::new(
            field,
            "La date de fin doit être postérieure ou égale à la date de départ",
        ))
    } else {
        Ok(())
    }
}

/// Empty string is "absent"; anything else must parse to a positive number.
pub fn parse_optional_positive(
    field: &'static str,
    label: &str,
    value: &str,
) -> Result<Option<f64>, ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(None);
    }
    match v.replace(',', ".").parse::<f64>() {
        Ok(n) if n > 0.0 => Ok(Some(n)),
        Ok(_) => Err(ValidationError::new(field, format!("{} doit être positif", label))),
        Err(_) => Err(ValidationError::new(field, format!("{} doit être un nombre", label))),
    }
}

pub fn require_positive(
    field: &'static str,
    label: &str,
    value: &str,
) -> Result<f64, ValidationError> {
    parse_optional_positive(field, label, value)?
        .ok_or_else(|| ValidationError::new(field, format!("{} requis", label)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_numeric_is_absent_not_error() {
        assert_eq!(parse_optional_positive("poids", "Poids", "").unwrap(), None);
        assert_eq!(parse_optional_positive("poids", "Poids", "  ").unwrap(), None);
    }

    #[test]
    fn test_numeric_rejects_garbage_and_non_positive() {
        assert!(parse_optional_positive("poids", "Poids", "abc").is_err());
        assert!(parse_optional_positive("poids", "Poids", "0").is_err());
        assert!(parse_optional_positive("poids", "Poids", "-3").is_err());
        assert_eq!(parse_optional_positive("poids", "Poids", "12,5").unwrap(), Some(12.5));
    }

    #[test]
    fn test_date_order() {
        let debut = parse_date("dateDebut", "Date de départ", "2026-08-10").unwrap();
        let fin = parse_date("dateFin", "Date d'arrivée", "2026-08-09").unwrap();
        assert!(require_date_order("dateFin", debut, fin).is_err());
        assert!(require_date_order("dateFin", debut, debut).is_ok());
    }

    #[test]
    fn test_email_shape() {
        assert!(require_email("email", "sara@exemple.ma").is_ok());
        assert!(require_email("email", "sara@").is_err());
        assert!(require_email("email", "sara.exemple.ma").is_err());
    }
}
