pub mod command_runner;
pub mod key_grabber;
pub mod virtual_device;

pub use command_runner::{create_command_runner, CommandRunner};
pub use key_grabber::{create_key_grabber, KeyGrabber};
pub use virtual_device::VirtualDevice;
