//! Terminal rendering for the menu widget

pub mod menu_widget;

pub use menu_widget::render as render_menu;
