use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field-level validation messages, keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        // First message wins so the most basic problem ("required") is shown
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Turn the collected messages into a result
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Errors surfaced by the schedule store and controller
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("validation failed ({0})")]
    Validation(FieldErrors),

    #[error("lesson {0} not found")]
    NotFound(i64),

    #[error("persistence failed: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

impl From<FieldErrors> for ScheduleError {
    fn from(errors: FieldErrors) -> Self {
        ScheduleError::Validation(errors)
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("room", "Room is required");
        errors.add("room", "Room is too long");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("room"), Some("Room is required"));
    }

    #[test]
    fn test_field_errors_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.add("day", "Pick a day");
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.get("day"), Some("Pick a day"));
    }

    #[test]
    fn test_field_errors_display_sorted() {
        let mut errors = FieldErrors::new();
        errors.add("room", "required");
        errors.add("color", "unknown");

        assert_eq!(errors.to_string(), "color: unknown; room: required");
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let mut errors = FieldErrors::new();
        errors.add("startTime", "Use HH:MM");

        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"startTime":"Use HH:MM"}"#);
    }

    #[test]
    fn test_schedule_error_messages() {
        assert_eq!(ScheduleError::NotFound(7).to_string(), "lesson 7 not found");

        let err = ScheduleError::Persistence(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "persistence failed: disk full");
    }
}
