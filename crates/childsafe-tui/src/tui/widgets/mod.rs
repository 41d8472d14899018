// TUI widget modules for each screen zone.

pub mod conversation;
pub mod examples;
pub mod help_bar;
pub mod input_box;
pub mod quit_confirm;
pub mod status_bar;
