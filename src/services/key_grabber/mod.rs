mod chord_filter;
mod dry_key_grabber;
mod evdev_key_grabber;
mod modifier_state;
mod r#trait;

pub use self::dry_key_grabber::DryRunKeyGrabber;
#[cfg(test)]
pub use self::dry_key_grabber::GrabCall;
pub use self::r#trait::{create_key_grabber, KeyGrabber};
