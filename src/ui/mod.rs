pub mod menu_bar;
pub mod overlay;
