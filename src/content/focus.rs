//! Focus guard: chorded keys must never fire while the user is typing.

const INPUT_TAGS: &[&str] = &["input", "textarea", "button"];
const INPUT_ROLES: &[&str] = &["textbox", "textarea", "input", "button"];

/// The page's focused element, reduced to what the guard needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveElement {
    pub tag_name: String,
    /// ARIA `role` attribute, if any.
    pub role: Option<String>,
}

impl ActiveElement {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Input-like by tag (case-insensitive) or by ARIA role.
    pub fn is_input_like(&self) -> bool {
        let tag = self.tag_name.to_ascii_lowercase();
        INPUT_TAGS.contains(&tag.as_str())
            || self
                .role
                .as_deref()
                .is_some_and(|role| INPUT_ROLES.contains(&role))
    }
}

/// Tracks page focus-in / focus-out notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusGuard {
    any_focused: bool,
}

impl FocusGuard {
    pub fn focus_in(&mut self) {
        self.any_focused = true;
    }

    pub fn focus_out(&mut self) {
        self.any_focused = false;
    }

    /// Whether a keypress should be ignored entirely.
    pub fn blocks(&self, active: Option<&ActiveElement>) -> bool {
        self.any_focused || active.is_some_and(ActiveElement::is_input_like)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_controls_are_input_like() {
        assert!(ActiveElement::new("INPUT").is_input_like());
        assert!(ActiveElement::new("textarea").is_input_like());
        assert!(ActiveElement::new("Button").is_input_like());
        assert!(!ActiveElement::new("body").is_input_like());
    }

    #[test]
    fn aria_roles_count_as_inputs() {
        assert!(ActiveElement::new("div").with_role("textbox").is_input_like());
        assert!(!ActiveElement::new("div").with_role("navigation").is_input_like());
    }

    #[test]
    fn focus_in_blocks_until_focus_out() {
        let mut guard = FocusGuard::default();
        assert!(!guard.blocks(None));

        guard.focus_in();
        assert!(guard.blocks(Some(&ActiveElement::new("body"))));

        guard.focus_out();
        assert!(!guard.blocks(Some(&ActiveElement::new("body"))));
        assert!(guard.blocks(Some(&ActiveElement::new("input"))));
    }
}
