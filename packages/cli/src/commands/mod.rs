pub mod init;
pub mod serve;
pub mod show;

pub use init::{init, InitArgs};
pub use serve::{serve, ServeArgs};
pub use show::{show, ShowArgs};
