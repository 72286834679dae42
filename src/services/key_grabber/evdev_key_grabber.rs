use crate::error::{MicrorunError, Result};
use crate::events::{KeyPress, Shortcut};
use crate::services::VirtualDevice;
use crate::settings::Settings;
use crate::utils::DeviceFinder;
use evdev::{Device, EventStream, EventType, InputEvent};
use std::io::Error;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::chord_filter::{ChordFilter, Verdict};
use super::r#trait::KeyGrabber;

/// Захват сочетаний через evdev: клавиатура захватывается целиком,
/// зарегистрированные сочетания доставляются демону, остальные события
/// пробрасываются в виртуальную клавиатуру uinput.
pub struct EvdevKeyGrabber {
    events: EventStream,
    device_name: String,
    virtual_device: VirtualDevice,
    filter: ChordFilter,
}

impl EvdevKeyGrabber {
    pub fn new(settings: &Settings) -> Result<Self> {
        info!("Инициализация EvdevKeyGrabber");

        let device_path = DeviceFinder::find_keyboard_device(&settings.input.device_path)?;

        let mut device = Device::open(&device_path).map_err(|e| {
            MicrorunError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        match device.grab() {
            Ok(_) => Self::log_grabbed_device(&device),
            Err(e) => {
                Self::log_grab_error(device_path, &e);
                return Err(MicrorunError::Permission(format!(
                    "Не удалось захватить устройство эксклюзивно: {}",
                    e
                )));
            }
        }

        let virtual_device = VirtualDevice::new(&settings.input.virtual_device_name)?;
        let device_name = device.name().unwrap_or("Unknown").to_string();
        let events = device.into_event_stream()?;

        Ok(Self {
            events,
            device_name,
            virtual_device,
            filter: ChordFilter::new(),
        })
    }

    fn handle_event(&mut self, event: InputEvent) -> Option<KeyPress> {
        let event_type = event.event_type();

        if event_type == EventType::KEY {
            match self.filter.process(event.code(), event.value()) {
                Verdict::Deliver(press) => {
                    debug!(
                        "Перехвачено сочетание {} (маска {:#06x}, {})",
                        press,
                        press.modifiers.bits(),
                        self.device_name
                    );
                    return Some(press);
                }
                Verdict::Swallow => return None,
                Verdict::Forward => {}
            }
        } else if event_type != EventType::SYNCHRONIZATION {
            return None;
        }

        if let Err(e) = self.virtual_device.forward(event_type.0, event.code(), event.value()) {
            debug!("Не удалось пробросить событие {:?}: {}", event, e);
        }
        None
    }

    fn log_grabbed_device(device: &Device) {
        info!("Устройство: {}", device.name().unwrap_or("Unknown"));
        info!("Физический путь: {:?}", device.physical_path());
        info!("Устройство захвачено эксклюзивно");
    }

    fn log_grab_error(device_path: PathBuf, e: &Error) {
        warn!(
            "Не удалось захватить устройство {}: {}",
            device_path.display(),
            e
        );
        warn!("Попробуйте:");
        warn!("1. Убедиться, что устройство не захвачено другим процессом");
        warn!("2. Добавить пользователя в группу input: sudo usermod -a -G input $USER");
        warn!("3. Перезайти в систему после добавления в группу");
    }
}

#[async_trait::async_trait]
impl KeyGrabber for EvdevKeyGrabber {
    fn grab(&mut self, shortcut: Shortcut) -> Result<()> {
        self.filter.grab(shortcut)?;
        debug!("Сочетание {} зарегистрировано", shortcut);
        Ok(())
    }

    fn ungrab(&mut self, shortcut: Shortcut) -> Result<()> {
        self.filter.ungrab(shortcut);
        debug!("Сочетание {} освобождено", shortcut);
        Ok(())
    }

    async fn next_event(&mut self) -> Result<KeyPress> {
        loop {
            let event = self.events.next_event().await?;
            if let Some(press) = self.handle_event(event) {
                return Ok(press);
            }
        }
    }
}

impl Drop for EvdevKeyGrabber {
    fn drop(&mut self) {
        // Захват устройства снимается ядром при закрытии дескриптора
        info!("Освобождение захваченного устройства {}", self.device_name);
    }
}
