use crate::error::{MicrorunError, Result};
use evdev::{Device, KeyCode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BY_ID_DIR: &str = "/dev/input/by-id";
const INPUT_DIR: &str = "/dev/input";

/// Клавиши, без которых устройство не считается клавиатурой
const REQUIRED_KEYS: [KeyCode; 3] = [KeyCode::KEY_A, KeyCode::KEY_SPACE, KeyCode::KEY_ENTER];

pub struct DeviceFinder;

impl DeviceFinder {
    /// Путь к клавиатуре: явно заданный или найденный автоматически (`auto`)
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            if !path.exists() {
                return MicrorunError::device_not_found(format!(
                    "Указанное устройство не найдено: {:?}",
                    path
                ));
            }
            info!("Используется указанное устройство: {:?}", path);
            return Ok(path);
        }

        info!("Автопоиск клавиатурного устройства...");

        let by_id = Self::list_dir(Path::new(BY_ID_DIR), is_by_id_keyboard);
        let events = Self::list_dir(Path::new(INPUT_DIR), is_event_node);

        by_id
            .into_iter()
            .chain(events)
            .find(|path| Self::is_keyboard(path))
            .map(|path| {
                info!("Найдена клавиатура: {:?}", path);
                path
            })
            .ok_or_else(|| {
                MicrorunError::DeviceNotFound(
                    "Не удалось найти клавиатуру. Убедитесь, что пользователь в группе 'input'"
                        .to_string(),
                )
            })
    }

    /// Отсортированные записи каталога, подходящие под `filter`.
    /// Недоступный каталог даёт пустой список.
    fn list_dir(dir: &Path, filter: fn(&str) -> bool) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Не удалось прочитать {:?}: {}", dir, e);
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(filter)
            })
            .collect();
        paths.sort_by_key(|path| event_number(path));
        paths
    }

    fn is_keyboard(path: &Path) -> bool {
        let device = match Device::open(path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Не удалось открыть {:?}: {}", path, e);
                return false;
            }
        };

        let is_keyboard = device
            .supported_keys()
            .is_some_and(|keys| REQUIRED_KEYS.iter().all(|key| keys.contains(*key)));

        debug!(
            "{:?} ({}): {}",
            path,
            device.name().unwrap_or("Unknown"),
            if is_keyboard { "клавиатура" } else { "не клавиатура" }
        );
        is_keyboard
    }
}

fn is_by_id_keyboard(name: &str) -> bool {
    name.ends_with("-event-kbd")
}

fn is_event_node(name: &str) -> bool {
    name.strip_prefix("event")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// `event10` сортируется после `event9`; прочие имена идут в конец
fn event_number(path: &Path) -> (u32, PathBuf) {
    let number = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("event"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX);
    (number, path.to_path_buf())
}
