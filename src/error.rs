use crate::events::Shortcut;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MicrorunError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка uinput: {0}")]
    Uinput(#[from] uinput::Error),

    #[error("Не удалось открыть файл конфигурации {path:?}: {reason}")]
    ConfigIo { path: PathBuf, reason: String },

    #[error("Конфигурация изменилась между проходами: ожидалось {expected_amount} сочетаний (макс. длина {expected_length}), получено {actual_amount} (макс. длина {actual_length})")]
    Misaligned {
        expected_amount: usize,
        expected_length: usize,
        actual_amount: usize,
        actual_length: usize,
    },

    #[error("Сочетание {0} уже захвачено")]
    GrabConflict(Shortcut),

    #[error("Источник событий закрыт")]
    EventSourceClosed,

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),
}

impl MicrorunError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(MicrorunError::DeviceNotFound(msg.into()))
    }

    pub fn config_io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MicrorunError::ConfigIo {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MicrorunError>;
