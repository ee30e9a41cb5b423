use std::collections::BTreeMap;

/// Field name -> first failure message recorded for it.
pub type FieldErrors = BTreeMap<String, String>;

/// Accumulates field-level validation failures.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    /// Only the first message per field is kept.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_checks_record_nothing() {
        let mut v = Validator::new();
        v.check(true, "name", "must be provided");
        assert!(v.is_empty());
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut v = Validator::new();
        v.check(false, "name", "must be provided");
        v.check(false, "name", "must not be more than 25 bytes long");
        v.check(false, "email_address", "invalid email provided");

        assert!(!v.is_empty());
        assert_eq!(v.errors().len(), 2);
        assert_eq!(v.errors()["name"], "must be provided");
        assert_eq!(v.errors()["email_address"], "invalid email provided");
    }
}
