pub mod chrome;
pub mod html_view;
pub mod region;
pub mod sidebar;
pub mod status_bar;
