pub const SHIFT: &str = "Shift";
pub const CONTROL: &str = "Control";
pub const ALT: &str = "Alt";

/// Map a raw key symbol (`Shift_L`, `Control_R`, `A`, `Return`, ...) to its
/// canonical token. Unknown symbols pass through unchanged.
pub fn normalize(raw: &str) -> String {
    match raw {
        "Shift_L" | "Shift_R" | SHIFT => SHIFT.to_string(),
        "Control_L" | "Control_R" | CONTROL => CONTROL.to_string(),
        "Alt_L" | "Alt_R" | ALT => ALT.to_string(),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_alphabetic() => c.to_lowercase().collect(),
                _ => raw.to_string(),
            }
        }
    }
}

pub fn is_modifier(token: &str) -> bool {
    matches!(token, SHIFT | CONTROL | ALT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_sides_collapse() {
        assert_eq!(normalize("Shift_L"), "Shift");
        assert_eq!(normalize("Shift_R"), "Shift");
        assert_eq!(normalize("Control_L"), "Control");
        assert_eq!(normalize("Control_R"), "Control");
        assert_eq!(normalize("Alt_L"), "Alt");
        assert_eq!(normalize("Alt_R"), "Alt");
    }

    #[test]
    fn test_letters_lowercased() {
        assert_eq!(normalize("A"), "a");
        assert_eq!(normalize("a"), "a");
        assert_eq!(normalize("Z"), normalize("z"));
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(normalize("Return"), "Return");
        assert_eq!(normalize("F5"), "F5");
        assert_eq!(normalize("1"), "1");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("Super_L"), "Super_L");
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["Shift_L", "Control_R", "Alt_L", "Q", "q", "Return", "space", "7"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn test_is_modifier() {
        assert!(is_modifier(SHIFT));
        assert!(is_modifier(CONTROL));
        assert!(is_modifier(ALT));
        assert!(!is_modifier("a"));
        assert!(!is_modifier("Shift_L"));
    }
}
