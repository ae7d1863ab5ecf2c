//! Terminal front-end: board, HUD, and typed input around a turn controller.

pub mod app;
pub mod board_widget;
pub mod theme;

pub use app::TuiApp;
pub use theme::Theme;
