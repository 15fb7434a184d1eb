//! Reusable widgets shared across screens.

pub mod confirm;
pub mod sub_tabs;
pub mod text_field;
pub mod toast;
