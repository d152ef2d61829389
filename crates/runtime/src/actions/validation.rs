/// Player and battle names are ASCII letters and digits only.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Text field that only ever holds an alphanumeric name.
///
/// Rejected edits leave the current value untouched. Clearing the field is
/// always allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameInput {
    value: String,
}

impl NameInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value. Returns whether the edit was accepted.
    pub fn set(&mut self, candidate: &str) -> bool {
        if !candidate.is_empty() && !is_valid_name(candidate) {
            return false;
        }
        self.value = candidate.to_string();
        true
    }
}
