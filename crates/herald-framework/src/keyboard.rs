//! Inline keyboard helpers.

use herald_core::{InlineKeyboardButton, InlineKeyboardMarkup};

/// A button carrying a callback token.
pub fn callback_button(text: impl Into<String>, token: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton {
        text: text.into(),
        callback_data: Some(token.into()),
        url: None,
    }
}

/// Drops every button whose callback data equals `data`, and any row left
/// empty by that.
pub fn remove_buttons_with_data(markup: &mut InlineKeyboardMarkup, data: &str) {
    for row in &mut markup.inline_keyboard {
        row.retain(|button| button.callback_data.as_deref() != Some(data));
    }
    markup.inline_keyboard.retain(|row| !row.is_empty());
}

/// Replaces every button whose callback data equals `data`. Returns how many
/// were replaced.
pub fn replace_buttons_with_data(
    markup: &mut InlineKeyboardMarkup,
    data: &str,
    replacement: &InlineKeyboardButton,
) -> usize {
    let mut replaced = 0;
    for button in markup.inline_keyboard.iter_mut().flatten() {
        if button.callback_data.as_deref() == Some(data) {
            *button = replacement.clone();
            replaced += 1;
        }
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup() -> InlineKeyboardMarkup {
        InlineKeyboardMarkup {
            inline_keyboard: vec![
                vec![callback_button("Yes", "a;1"), callback_button("No", "a;2")],
                vec![callback_button("Cancel", "a;2")],
            ],
        }
    }

    #[test]
    fn test_remove_drops_empty_rows() {
        let mut markup = markup();
        remove_buttons_with_data(&mut markup, "a;2");
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0].len(), 1);
        assert_eq!(markup.inline_keyboard[0][0].text, "Yes");
    }

    #[test]
    fn test_replace() {
        let mut markup = markup();
        let done = callback_button("Done", "nop;0");
        assert_eq!(replace_buttons_with_data(&mut markup, "a;2", &done), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Done");
        assert_eq!(replace_buttons_with_data(&mut markup, "missing", &done), 0);
    }
}
