pub mod app;
pub mod draw;
pub mod edit;
pub mod keymap;
pub mod launch;
pub mod session;
