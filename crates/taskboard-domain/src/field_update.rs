/// Three-state update for an optional field.
///
/// - `NoChange`: keep the existing value
/// - `Set(value)`: replace it
/// - `Clear`: remove it
///
/// # Example
///
/// ```
/// use taskboard_domain::FieldUpdate;
///
/// let mut description = Some("draft".to_string());
/// FieldUpdate::Set("final".to_string()).apply_to(&mut description);
/// assert_eq!(description.as_deref(), Some("final"));
///
/// FieldUpdate::<String>::Clear.apply_to(&mut description);
/// assert_eq!(description, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    #[default]
    NoChange,
    Set(T),
    Clear,
}

impl<T> FieldUpdate<T> {
    pub fn apply_to(self, field: &mut Option<T>) {
        match self {
            FieldUpdate::NoChange => {}
            FieldUpdate::Set(value) => *field = Some(value),
            FieldUpdate::Clear => *field = None,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, FieldUpdate::NoChange)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldUpdate<U> {
        match self {
            FieldUpdate::NoChange => FieldUpdate::NoChange,
            FieldUpdate::Set(value) => FieldUpdate::Set(f(value)),
            FieldUpdate::Clear => FieldUpdate::Clear,
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    /// `Some` sets the field, `None` clears it.
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(value) => FieldUpdate::Set(value),
            None => FieldUpdate::Clear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_change_keeps_value() {
        let mut field = Some(3);
        FieldUpdate::NoChange.apply_to(&mut field);
        assert_eq!(field, Some(3));
    }

    #[test]
    fn test_map_preserves_state() {
        let update = FieldUpdate::Set("  padded ".to_string()).map(|s| s.trim().to_string());
        assert_eq!(update, FieldUpdate::Set("padded".to_string()));
        assert_eq!(FieldUpdate::<i32>::Clear.map(|v| v + 1), FieldUpdate::Clear);
    }
}
