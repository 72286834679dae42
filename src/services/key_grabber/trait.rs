use crate::error::Result;
use crate::events::{KeyPress, Shortcut};
use crate::settings::Settings;

/// Trait for key grabbers: exclusive delivery of registered shortcuts
#[async_trait::async_trait]
pub trait KeyGrabber: Send {
    /// Register a shortcut. Fails with `GrabConflict` if it is already registered;
    /// callers are expected to log that and carry on.
    fn grab(&mut self, shortcut: Shortcut) -> Result<()>;

    /// Release a previously registered shortcut
    fn ungrab(&mut self, shortcut: Shortcut) -> Result<()>;

    /// Wait (without deadline) for the next press of a registered shortcut
    async fn next_event(&mut self) -> Result<KeyPress>;
}

/// Factory function to create an appropriate key grabber based on the dry_run flag
pub fn create_key_grabber(settings: &Settings, dry_run: bool) -> Result<Box<dyn KeyGrabber>> {
    if dry_run {
        Ok(Box::new(super::DryRunKeyGrabber::from_stdin()))
    } else {
        Ok(Box::new(super::evdev_key_grabber::EvdevKeyGrabber::new(settings)?))
    }
}
