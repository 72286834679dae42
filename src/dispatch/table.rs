use crate::events::{KeyPress, Shortcut};
use std::fmt;

pub const RESTART_KEYWORD: &str = "restart";
pub const EXIT_KEYWORD: &str = "exit";

/// Действие, привязанное к сочетанию
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Команда оболочки, запускается без ожидания
    Shell(String),
    /// Перечитать конфиг и начать новый цикл
    Restart,
    /// Завершить демон
    Exit,
}

impl Command {
    /// Длина команды для учёта в проходе Scan.
    /// Управляющие действия считаются по длине своего ключевого слова.
    pub fn len(&self) -> usize {
        match self {
            Command::Shell(text) => text.len(),
            Command::Restart => RESTART_KEYWORD.len(),
            Command::Exit => EXIT_KEYWORD.len(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Shell(text) => write!(f, "\"{}\"", text),
            Command::Restart => write!(f, "{}", RESTART_KEYWORD),
            Command::Exit => write!(f, "{}", EXIT_KEYWORD),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub shortcut: Shortcut,
    pub command: Command,
}

/// Скомпилированная таблица сочетаний.
///
/// Индекс записи равен порядку объявления в конфиге. Таблица строится один
/// раз на цикл и не меняется, пока работает цикл событий.
#[derive(Debug, Default)]
pub struct ShortcutTable {
    bindings: Vec<Binding>,
}

impl ShortcutTable {
    /// Пустая таблица с ёмкостью, посчитанной проходом Scan
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bindings: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, shortcut: Shortcut, command: Command) {
        self.bindings.push(Binding { shortcut, command });
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<&Binding> {
        self.bindings.get(index)
    }

    pub fn max_command_length(&self) -> usize {
        self.bindings
            .iter()
            .map(|binding| binding.command.len())
            .max()
            .unwrap_or(0)
    }

    /// Сочетания, которые нужно захватить (без заглушек "не назначено")
    pub fn bound_shortcuts(&self) -> impl Iterator<Item = Shortcut> + '_ {
        self.bindings
            .iter()
            .map(|binding| binding.shortcut)
            .filter(Shortcut::is_bound)
    }

    /// Линейный поиск: побеждает первое объявление с точным совпадением
    pub fn find(&self, event: &KeyPress) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|binding| event.matches(&binding.shortcut))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ModifierMask;

    fn table() -> ShortcutTable {
        let mut table = ShortcutTable::with_capacity(4);
        table.push(Shortcut::new(38, ModifierMask::MOD4), Command::Shell("first".into()));
        table.push(Shortcut::UNBOUND, Command::Shell("never".into()));
        table.push(Shortcut::new(38, ModifierMask::MOD4), Command::Shell("second".into()));
        table.push(Shortcut::new(9, ModifierMask::NONE), Command::Exit);
        table
    }

    #[test]
    fn test_first_declaration_wins() {
        let table = table();
        let binding = table.find(&KeyPress::new(38, ModifierMask::MOD4)).unwrap();
        assert_eq!(binding.command, Command::Shell("first".into()));
    }

    #[test]
    fn test_no_match_for_different_mask() {
        let table = table();
        assert!(table.find(&KeyPress::new(38, ModifierMask::NONE)).is_none());
    }

    #[test]
    fn test_bound_shortcuts_skip_unbound() {
        let table = table();
        let bound: Vec<Shortcut> = table.bound_shortcuts().collect();
        assert_eq!(bound.len(), 3);
        assert!(bound.iter().all(Shortcut::is_bound));
    }

    #[test]
    fn test_max_command_length() {
        let table = table();
        assert_eq!(table.max_command_length(), "second".len());
        assert_eq!(ShortcutTable::default().max_command_length(), 0);
        assert_eq!(Command::Restart.len(), 7);
        assert_eq!(Command::Exit.len(), 4);
    }
}
