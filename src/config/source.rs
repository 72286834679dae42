use crate::error::{MicrorunError, Result};
use crate::events::ModifierMask;
use crate::settings::ParserSettings;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Файл конфигурации горячих клавиш
pub struct ConfigSource {
    path: PathBuf,
    parser: ParserSettings,
}

impl ConfigSource {
    pub fn new(path: impl Into<PathBuf>, parser: ParserSettings) -> Self {
        Self {
            path: path.into(),
            parser,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Открывает файл для чтения. Отсутствующий файл создаётся с шаблоном
    /// документации и открывается заново.
    pub fn open(&self) -> Result<BufReader<File>> {
        if self.path.is_dir() {
            return Err(MicrorunError::config_io(&self.path, "путь является директорией"));
        }

        match File::open(&self.path) {
            Ok(file) => Ok(BufReader::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Файл конфигурации {:?} не найден, создаём шаблон", self.path);
                self.create_template()?;
                File::open(&self.path)
                    .map(BufReader::new)
                    .map_err(|e| MicrorunError::config_io(&self.path, e))
            }
            Err(e) => Err(MicrorunError::config_io(&self.path, e)),
        }
    }

    fn create_template(&self) -> Result<()> {
        fs::write(&self.path, render_template(&self.parser))
            .map_err(|e| MicrorunError::config_io(&self.path, format!("не удалось создать файл: {}", e)))?;
        info!("Создан файл конфигурации {:?}", self.path);
        Ok(())
    }
}

/// Текст, которым заполняется новый файл конфигурации
pub fn render_template(parser: &ParserSettings) -> String {
    let modifiers: Vec<&str> = ModifierMask::NAMED.iter().map(|(name, _)| *name).collect();

    let mut template = String::new();
    template.push_str("# microrun configuration file\n");
    template.push_str("#\n");
    template.push_str("# rules\n");
    template.push_str("#   one directive per line\n");
    template.push_str(&format!(
        "#   lines longer than {} characters are truncated\n",
        parser.line_width
    ));
    template.push_str(&format!(
        "#   only the first {} lines are read unless \"lines\" says otherwise\n",
        parser.default_lines
    ));
    template.push_str("#   keywords and modifier names are case-insensitive\n");
    template.push_str("#   lines starting with \"#\" are comments\n");
    template.push_str("#\n");
    template.push_str("# directives\n");
    template.push_str("#   lines = <expression>\n");
    template.push_str("#       number of lines to read, integer arithmetic with + - * / and ( )\n");
    template.push_str("#   onStart \"<command>\"\n");
    template.push_str("#       runs <command> once every time the configuration is loaded\n");
    template.push_str("#   keycode <keycode>[+<modifier>]* \"<command>\"\n");
    template.push_str("#       runs <command> when the key combination is pressed\n");
    template.push_str("#   keycode <keycode>[+<modifier>]* restart\n");
    template.push_str("#       reloads this file\n");
    template.push_str("#   keycode <keycode>[+<modifier>]* exit\n");
    template.push_str("#       stops the daemon\n");
    template.push_str("#\n");
    template.push_str("#   the first character after the keycode or \"onStart\" opens the command,\n");
    template.push_str("#   the next occurrence of the same character closes it\n");
    template.push_str("#   keycodes use X11 numbering (evdev code + 8), as printed by xev\n");
    template.push_str(&format!("#   modifiers: {}\n", modifiers.join(", ")));
    template.push_str("#\n");
    template.push_str("# example\n");
    template.push_str("#   keycode 28+Mod4 \"xterm\"\n");
    template.push_str("#   keycode 27+Mod4+Shift restart\n");
    template.push_str("#   keycode 26+Mod4+Shift exit\n");
    template.push('\n');
    template
}
