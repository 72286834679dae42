use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Бюджет строк по умолчанию, пока конфиг не переопределит его через `lines =`
pub const DEFAULT_LINES_COUNT: u64 = 1024;
/// Максимальная ширина строки конфига, остаток строки отбрасывается
pub const DEFAULT_LINE_WIDTH: usize = 1024;
/// Верхняя граница `parser.line_width`
pub const MAX_LINE_WIDTH: usize = 64 * 1024;

/// Настройки самого демона (не путать с файлом горячих клавиш)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub input: InputSettings,
    pub parser: ParserSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputSettings {
    pub device_path: String,
    pub virtual_device_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParserSettings {
    pub default_lines: u64,
    pub line_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            input: InputSettings {
                device_path: "auto".to_string(),
                virtual_device_name: "microrun passthrough".to_string(),
            },
            parser: ParserSettings {
                default_lines: DEFAULT_LINES_COUNT,
                line_width: DEFAULT_LINE_WIDTH,
            },
        }
    }
}

impl Settings {
    /// Загрузка: значения по умолчанию -> TOML файл (если есть) -> переменные MICRORUN_*
    pub fn load<P: AsRef<Path>>(settings_path: P) -> Result<Self> {
        let settings_path = settings_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(settings_path))
            .merge(Env::prefixed("MICRORUN_").split("__"));

        let settings: Settings = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить настройки из {:?}", settings_path))?;

        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "pretty" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.input.device_path.is_empty() {
            anyhow::bail!("input.device_path не может быть пустым (используйте \"auto\")");
        }

        if self.parser.line_width == 0 || self.parser.line_width > MAX_LINE_WIDTH {
            anyhow::bail!(
                "parser.line_width должно быть от 1 до {}, получено {}",
                MAX_LINE_WIDTH,
                self.parser.line_width
            );
        }

        if self.parser.default_lines == 0 {
            anyhow::bail!("parser.default_lines должно быть больше 0");
        }

        Ok(())
    }
}
