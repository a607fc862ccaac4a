use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};

/// A raw key transition in keysym form, ready for the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Press(String),
    Release(String),
}

/// Keysym-style name for a crossterm key code (`Shift_L`, `a`, `Return`, ...)
pub fn keysym(code: &KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Modifier(m) => modifier_keysym(m).to_string(),
        KeyCode::Enter => "Return".to_string(),
        KeyCode::Backspace => "BackSpace".to_string(),
        KeyCode::Tab | KeyCode::BackTab => "Tab".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Insert => "Insert".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "Prior".to_string(),
        KeyCode::PageDown => "Next".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        KeyCode::CapsLock => "Caps_Lock".to_string(),
        other => format!("{other:?}"),
    }
}

fn modifier_keysym(m: &ModifierKeyCode) -> &'static str {
    match m {
        ModifierKeyCode::LeftShift => "Shift_L",
        ModifierKeyCode::RightShift => "Shift_R",
        ModifierKeyCode::LeftControl => "Control_L",
        ModifierKeyCode::RightControl => "Control_R",
        ModifierKeyCode::LeftAlt => "Alt_L",
        ModifierKeyCode::RightAlt => "Alt_R",
        ModifierKeyCode::LeftSuper => "Super_L",
        ModifierKeyCode::RightSuper => "Super_R",
        ModifierKeyCode::LeftHyper => "Hyper_L",
        ModifierKeyCode::RightHyper => "Hyper_R",
        ModifierKeyCode::LeftMeta => "Meta_L",
        ModifierKeyCode::RightMeta => "Meta_R",
        ModifierKeyCode::IsoLevel3Shift => "ISO_Level3_Shift",
        ModifierKeyCode::IsoLevel5Shift => "ISO_Level5_Shift",
    }
}

/// Turn a terminal key event into press/release actions.
///
/// With keyboard enhancement the terminal reports modifiers as keys of their
/// own along with releases, so events map one to one. Legacy terminals only
/// report characters with a modifier mask: the held modifiers are pressed
/// first, then the key, and nothing is ever released.
pub fn translate(key: &KeyEvent, enhanced: bool) -> Vec<KeyAction> {
    let sym = keysym(&key.code);

    if enhanced {
        return match key.kind {
            KeyEventKind::Press => vec![KeyAction::Press(sym)],
            KeyEventKind::Release => vec![KeyAction::Release(sym)],
            KeyEventKind::Repeat => vec![],
        };
    }

    if key.kind != KeyEventKind::Press {
        return vec![];
    }

    // legacy encodings cannot tell Ctrl+I from Tab or Ctrl+M from Enter
    if key.modifiers.is_empty() {
        let letter = match key.code {
            KeyCode::Tab => Some("i"),
            KeyCode::Enter => Some("m"),
            _ => None,
        };
        if let Some(letter) = letter {
            return vec![
                KeyAction::Press("Control_L".to_string()),
                KeyAction::Press(letter.to_string()),
            ];
        }
    }

    let mut actions = Vec::new();
    let shifted_char = matches!(key.code, KeyCode::Char(c) if c.is_uppercase());
    if key.modifiers.contains(KeyModifiers::SHIFT) || shifted_char {
        actions.push(KeyAction::Press("Shift_L".to_string()));
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        actions.push(KeyAction::Press("Control_L".to_string()));
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        actions.push(KeyAction::Press("Alt_L".to_string()));
    }
    actions.push(KeyAction::Press(sym));
    actions
}
