pub mod canvas;
pub mod channel;
pub mod config;
pub mod consts;
pub mod dispatch;
pub mod error;
pub mod pixel;
pub mod registry;
