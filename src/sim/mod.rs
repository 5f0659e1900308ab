pub mod event;
pub mod save;
pub mod scene;
pub mod step;
