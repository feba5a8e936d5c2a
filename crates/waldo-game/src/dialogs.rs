//! Modal dialogs. They block the event loop until answered.

use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use winit::window::Window;

pub trait Prompt {
    /// Returns `true` when the player confirms quitting.
    fn confirm_quit(&self) -> bool;

    /// Announces the win; the game exits afterwards.
    fn celebrate(&self);
}

/// Native message boxes parented to the game window.
pub struct RfdPrompt<'w> {
    window: &'w Window,
}

impl<'w> RfdPrompt<'w> {
    pub fn new(window: &'w Window) -> Self {
        Self { window }
    }
}

impl Prompt for RfdPrompt<'_> {
    fn confirm_quit(&self) -> bool {
        let answer = MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title("Quit")
            .set_description("Are you done looking for Waldo?")
            .set_buttons(MessageButtons::OkCancel)
            .set_parent(self.window)
            .show();
        log::debug!("quit dialog answered {answer:?}");
        matches!(answer, MessageDialogResult::Ok)
    }

    fn celebrate(&self) {
        MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title("Well Done!")
            .set_description("Well Done! You have found Waldo!")
            .set_buttons(MessageButtons::OkCustom("Cool! Bye!".to_string()))
            .set_parent(self.window)
            .show();
    }
}
