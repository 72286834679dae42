//! Цикл событий: захват сочетаний, ожидание нажатий, выполнение действий.

use super::table::{Command, ShortcutTable};
use crate::debug_if_enabled;
use crate::error::MicrorunError;
use crate::events::{KeyPress, Shortcut};
use crate::services::{CommandRunner, KeyGrabber};
use std::fmt;
use tracing::{error, info, warn};

/// Состояние цикла. `Restart` и `Exit` завершают текущий цикл.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Continue,
    Restart,
    Exit,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Continue => write!(f, "Continue"),
            Mode::Restart => write!(f, "Restart"),
            Mode::Exit => write!(f, "Exit"),
        }
    }
}

pub struct DispatchLoop<'a> {
    table: &'a ShortcutTable,
    grabber: &'a mut dyn KeyGrabber,
    runner: &'a dyn CommandRunner,
    mode: Mode,
    grabbed: Vec<Shortcut>,
}

impl<'a> DispatchLoop<'a> {
    pub fn new(
        table: &'a ShortcutTable,
        grabber: &'a mut dyn KeyGrabber,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            table,
            grabber,
            runner,
            mode: Mode::Continue,
            grabbed: Vec::with_capacity(table.len()),
        }
    }

    /// Полный цикл: захват, обработка событий, освобождение.
    /// Возвращает состояние, которым закончился цикл (`Restart` или `Exit`).
    pub async fn run(mut self) -> Mode {
        self.grab_all();
        info!("Захвачено {} сочетаний, ожидаем события", self.grabbed.len());

        while self.mode == Mode::Continue {
            match self.grabber.next_event().await {
                Ok(event) => self.handle_event(event),
                Err(e) => {
                    error!("Ошибка источника событий: {}", e);
                    self.mode = Mode::Exit;
                }
            }
        }

        self.ungrab_all();
        info!("Цикл событий завершён: {}", self.mode);
        self.mode
    }

    fn grab_all(&mut self) {
        for shortcut in self.table.bound_shortcuts() {
            match self.grabber.grab(shortcut) {
                Ok(()) => self.grabbed.push(shortcut),
                Err(MicrorunError::GrabConflict(shortcut)) => {
                    warn!("Сочетание {} уже захвачено, пропускаем", shortcut);
                }
                Err(e) => error!("Не удалось захватить сочетание {}: {}", shortcut, e),
            }
        }
    }

    fn ungrab_all(&mut self) {
        for shortcut in self.grabbed.drain(..) {
            if let Err(e) = self.grabber.ungrab(shortcut) {
                warn!("Не удалось освободить сочетание {}: {}", shortcut, e);
            }
        }
    }

    fn handle_event(&mut self, event: KeyPress) {
        let Some(binding) = self.table.find(&event) else {
            debug_if_enabled!("Нет действия для сочетания {}", event);
            return;
        };

        match &binding.command {
            Command::Restart => {
                info!("Сочетание {}: перезапуск", event);
                self.mode = Mode::Restart;
            }
            Command::Exit => {
                info!("Сочетание {}: выход", event);
                self.mode = Mode::Exit;
            }
            Command::Shell(command) => {
                info!("Сочетание {}: запуск {:?}", event, command);
                self.runner.run(command);
            }
        }
    }
}
