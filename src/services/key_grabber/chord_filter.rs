use super::modifier_state::ModifierState;
use crate::error::{MicrorunError, Result};
use crate::events::{KeyPress, Shortcut};
use evdev::KeyCode;
use std::collections::HashSet;

/// Смещение между кодами evdev и кодами клавиш X11
pub const X11_KEYCODE_OFFSET: u32 = 8;

/// Что делать с событием клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Нажатие зарегистрированного сочетания
    Deliver(KeyPress),
    /// Отпускание/автоповтор уже доставленной клавиши
    Swallow,
    /// Событие уходит в виртуальную клавиатуру
    Forward,
}

/// Решает судьбу событий клавиатуры: зарегистрированные сочетания
/// перехватываются, всё остальное пробрасывается дальше.
#[derive(Debug, Default)]
pub struct ChordFilter {
    modifier_state: ModifierState,
    grabbed: HashSet<Shortcut>,
    swallowed: HashSet<u16>,
}

impl ChordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grab(&mut self, shortcut: Shortcut) -> Result<()> {
        if self.grabbed.insert(shortcut) {
            Ok(())
        } else {
            Err(MicrorunError::GrabConflict(shortcut))
        }
    }

    pub fn ungrab(&mut self, shortcut: Shortcut) {
        self.grabbed.remove(&shortcut);
    }

    pub fn process(&mut self, code: u16, value: i32) -> Verdict {
        // Маска берётся до учёта самого события, как у X11
        let mask = self.modifier_state.to_mask();
        self.modifier_state.update_key(KeyCode::new(code), value);

        if value == 1 {
            let press = KeyPress::new(u32::from(code) + X11_KEYCODE_OFFSET, mask);
            if self.grabbed.contains(&press.as_shortcut()) {
                self.swallowed.insert(code);
                return Verdict::Deliver(press);
            }
        } else if self.swallowed.contains(&code) {
            if value == 0 {
                self.swallowed.remove(&code);
            }
            return Verdict::Swallow;
        }

        Verdict::Forward
    }
}
