use crate::error::{MicrorunError, Result};
use tracing::{debug, info};

/// Виртуальная клавиатура uinput: через неё проходят все события,
/// которые не являются зарегистрированными сочетаниями.
pub struct VirtualDevice {
    device: uinput::Device,
    device_name: String,
}

impl VirtualDevice {
    pub fn new(device_name: &str) -> Result<Self> {
        info!("Создание виртуального устройства uinput '{}' для проброса клавиш", device_name);

        let device = uinput::default()?
            .name(device_name)?
            .event(uinput::event::Keyboard::All)?
            .create()
            .map_err(|e| {
                MicrorunError::Permission(format!(
                    "Не удалось создать виртуальное устройство '{}': {}",
                    device_name, e
                ))
            })?;

        info!("Виртуальное устройство '{}' создано успешно", device_name);
        Ok(Self {
            device,
            device_name: device_name.to_string(),
        })
    }

    /// Пробрасывает событие как есть (тип, код, значение)
    pub fn forward(&mut self, event_type: u16, code: u16, value: i32) -> Result<()> {
        self.device
            .write(i32::from(event_type), i32::from(code), value)?;
        Ok(())
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        debug!("Закрытие виртуального устройства '{}'", self.device_name);
    }
}
