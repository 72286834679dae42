use crate::events::ModifierMask;
use evdev::KeyCode;

/// Текущее состояние модификаторов клавиатуры в терминах масок X11
#[derive(Debug, Default)]
pub struct ModifierState {
    shift: bool,
    control: bool,
    alt: bool,
    alt_gr: bool,
    super_key: bool,
    caps_lock: bool,
    num_lock: bool,
}

impl ModifierState {
    /// `value`: 0 - отпускание, 1 - нажатие, 2 - автоповтор
    pub fn update_key(&mut self, key: KeyCode, value: i32) {
        let pressed = value != 0;
        match key {
            KeyCode::KEY_LEFTSHIFT | KeyCode::KEY_RIGHTSHIFT => self.shift = pressed,
            KeyCode::KEY_LEFTCTRL | KeyCode::KEY_RIGHTCTRL => self.control = pressed,
            KeyCode::KEY_LEFTALT => self.alt = pressed,
            KeyCode::KEY_RIGHTALT => self.alt_gr = pressed,
            KeyCode::KEY_LEFTMETA | KeyCode::KEY_RIGHTMETA => self.super_key = pressed,
            // Lock-клавиши переключаются только по первому нажатию
            KeyCode::KEY_CAPSLOCK if value == 1 => self.caps_lock = !self.caps_lock,
            KeyCode::KEY_NUMLOCK if value == 1 => self.num_lock = !self.num_lock,
            _ => {}
        }
    }

    pub fn to_mask(&self) -> ModifierMask {
        ModifierMask::NONE
            .with(ModifierMask::SHIFT, self.shift)
            .with(ModifierMask::LOCK, self.caps_lock)
            .with(ModifierMask::CONTROL, self.control)
            .with(ModifierMask::MOD1, self.alt)
            .with(ModifierMask::MOD2, self.num_lock)
            .with(ModifierMask::MOD4, self.super_key)
            .with(ModifierMask::MOD5, self.alt_gr)
    }
}
