use crate::error::{MicrorunError, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{info, warn};

const INPUT_DIR: &str = "/dev/input";
const UINPUT_DEVICE: &str = "/dev/uinput";

/// Доступ к устройствам ввода и uinput нужен только для настоящего захвата
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    check_input_access(Path::new(INPUT_DIR))?;
    check_uinput_access(Path::new(UINPUT_DEVICE))?;
    warn_if_root(std::env::var("USER").ok().as_deref());

    info!("Проверка прав доступа завершена");
    Ok(())
}

fn check_input_access(input_dir: &Path) -> Result<()> {
    fs::read_dir(input_dir).map_err(|e| {
        MicrorunError::Permission(format!(
            "Нет доступа к {}: {}. Добавьте пользователя в группу 'input'",
            input_dir.display(),
            e
        ))
    })?;
    info!("Доступ к {} подтверждён", input_dir.display());
    Ok(())
}

fn check_uinput_access(device: &Path) -> Result<()> {
    let metadata = match fs::metadata(device) {
        Ok(metadata) => metadata,
        Err(_) => {
            // Модуль может быть загружен позже, создание VirtualDevice сообщит точную ошибку
            warn!("{} не существует, возможно модуль uinput не загружен", device.display());
            return Ok(());
        }
    };

    if metadata.permissions().mode() & 0o066 == 0 {
        return Err(MicrorunError::Permission(format!(
            "Нет прав доступа к {}. Добавьте пользователя в группу 'uinput' или 'input'",
            device.display()
        )));
    }

    info!("Доступ к {} подтверждён", device.display());
    Ok(())
}

/// `true`, если процесс запущен от root
fn warn_if_root(user: Option<&str>) -> bool {
    match user {
        Some("root") => {
            warn!("Демон запущен от имени root");
            warn!("Рекомендуется: sudo usermod -a -G input,uinput $USER && sudo modprobe uinput");
            true
        }
        Some(user) => {
            info!("Демон запущен от имени пользователя: {}", user);
            false
        }
        None => {
            warn!("Не удалось определить пользователя");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_dir_is_permission_error() {
        let result = check_input_access(Path::new("/non/existent/input"));
        assert!(matches!(result, Err(MicrorunError::Permission(_))));
    }

    #[test]
    fn test_missing_uinput_is_tolerated() {
        assert!(check_uinput_access(Path::new("/non/existent/uinput")).is_ok());
    }

    #[test]
    fn test_unreadable_uinput_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600)).unwrap();
        assert!(matches!(
            check_uinput_access(file.path()),
            Err(MicrorunError::Permission(_))
        ));

        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o660)).unwrap();
        assert!(check_uinput_access(file.path()).is_ok());
    }

    #[test]
    fn test_root_detection() {
        assert!(warn_if_root(Some("root")));
        assert!(!warn_if_root(Some("alice")));
        assert!(!warn_if_root(None));
    }
}
