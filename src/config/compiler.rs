//! Двухпроходный компилятор конфига.
//!
//! Scan считает количество сочетаний и максимальную длину команды, Build
//! выделяет таблицу ровно этого размера и заполняет её. Оба прохода идут
//! через один и тот же обход строк, поэтому индексы записей совпадают.
//!
//! Файл читается дважды. Если его изменить между проходами, Build вернёт
//! [`MicrorunError::Misaligned`]: защиты от одновременной правки нет, есть
//! только обнаружение расхождения.

use super::arithmetic::get_unsigned_integer;
use super::diagnostic::Diagnostic;
use super::lexer::Cursor;
use super::scanner::LineScanner;
use crate::dispatch::{Command, ShortcutTable, EXIT_KEYWORD, RESTART_KEYWORD};
use crate::error::{MicrorunError, Result};
use crate::events::{ModifierMask, Shortcut};
use crate::services::CommandRunner;
use crate::settings::ParserSettings;
use std::io::BufRead;
use tracing::{debug, info, warn};

const COMMENT_KEYWORD: &str = "#";
const LINES_KEYWORD: &str = "lines";
const ON_START_KEYWORD: &str = "onStart";
const KEYCODE_KEYWORD: &str = "keycode";

/// Разобранная строка конфига
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Blank,
    Comment,
    /// `None`: строка `lines` без `=`, либо бюджет уже был задан
    Lines(Option<u64>),
    OnStart(String),
    Binding { shortcut: Shortcut, command: Command },
    Unrecognized,
}

/// Результат прохода Scan
#[derive(Debug, Default)]
pub struct ScanReport {
    pub shortcut_amount: usize,
    pub max_command_length: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Состояние одного прохода
#[derive(Debug)]
struct PassState {
    line_budget: u64,
    lines_read: bool,
    restart_seen: bool,
    exit_seen: bool,
}

impl PassState {
    fn new(line_budget: u64) -> Self {
        Self {
            line_budget,
            lines_read: false,
            restart_seen: false,
            exit_seen: false,
        }
    }

    /// `false`, если управляющее действие уже встречалось в этом проходе
    fn admit(&mut self, command: &Command) -> bool {
        let seen = match command {
            Command::Restart => &mut self.restart_seen,
            Command::Exit => &mut self.exit_seen,
            Command::Shell(_) => return true,
        };
        !std::mem::replace(seen, true)
    }
}

pub struct ShortcutCompiler {
    default_lines: u64,
    line_width: usize,
}

impl ShortcutCompiler {
    pub fn new(settings: &ParserSettings) -> Self {
        Self {
            default_lines: settings.default_lines,
            line_width: settings.line_width,
        }
    }

    /// Проход Scan: считает сочетания и выполняет `onStart`.
    /// Диагностики пишутся в лог и возвращаются в отчёте.
    pub fn scan<R: BufRead>(&self, reader: R, runner: &dyn CommandRunner) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        let mut diagnostics = Vec::new();

        self.walk(reader, &mut diagnostics, |directive| match directive {
            Directive::OnStart(command) => {
                info!("onStart: {}", command);
                runner.run(&command);
            }
            Directive::Binding { command, .. } => {
                report.shortcut_amount += 1;
                report.max_command_length = report.max_command_length.max(command.len());
            }
            _ => {}
        })?;

        for diagnostic in &diagnostics {
            warn!(line = diagnostic.line(), "{}", diagnostic);
        }
        report.diagnostics = diagnostics;

        info!(
            "Scan: {} сочетаний, максимальная длина команды {}",
            report.shortcut_amount, report.max_command_length
        );
        Ok(report)
    }

    /// Проход Build: заполняет таблицу, размер которой посчитал Scan
    pub fn build<R: BufRead>(&self, reader: R, report: &ScanReport) -> Result<ShortcutTable> {
        let mut table = ShortcutTable::with_capacity(report.shortcut_amount);
        // Диагностики уже выведены проходом Scan
        let mut diagnostics = Vec::new();

        self.walk(reader, &mut diagnostics, |directive| {
            if let Directive::Binding { shortcut, command } = directive {
                table.push(shortcut, command);
            }
        })?;

        if table.len() != report.shortcut_amount
            || table.max_command_length() != report.max_command_length
        {
            return Err(MicrorunError::Misaligned {
                expected_amount: report.shortcut_amount,
                expected_length: report.max_command_length,
                actual_amount: table.len(),
                actual_length: table.max_command_length(),
            });
        }

        Ok(table)
    }

    /// Общий обход строк для обоих проходов. Бюджет строк, `lines =` и
    /// повторы restart/exit обрабатываются здесь; `visit` получает только
    /// `OnStart` и принятые `Binding`.
    fn walk<R, F>(&self, reader: R, diagnostics: &mut Vec<Diagnostic>, mut visit: F) -> Result<()>
    where
        R: BufRead,
        F: FnMut(Directive),
    {
        let mut scanner = LineScanner::new(reader, self.line_width);
        let mut state = PassState::new(self.default_lines);
        let mut line_number: usize = 0;

        while (line_number as u64) < state.line_budget {
            let Some(line) = scanner.next_line()? else {
                break;
            };
            line_number += 1;

            match parse_line(line_number, line, !state.lines_read, diagnostics) {
                Directive::Lines(Some(budget)) => {
                    debug!("Строка {}: бюджет строк {}", line_number, budget);
                    state.line_budget = budget;
                    state.lines_read = true;
                }
                Directive::Unrecognized => {
                    diagnostics.push(Diagnostic::DirectiveWarning {
                        line: line_number,
                        text: line.to_string(),
                    });
                }
                Directive::Binding { shortcut, command } => {
                    if state.admit(&command) {
                        visit(Directive::Binding { shortcut, command });
                    } else {
                        debug!("Строка {}: повтор {} пропущен", line_number, command);
                    }
                }
                directive @ Directive::OnStart(_) => visit(directive),
                Directive::Blank | Directive::Comment | Directive::Lines(None) => {}
            }
        }

        Ok(())
    }
}

/// Разбор одной строки. `lines_pending` - можно ли ещё принять `lines =`.
pub fn parse_line(
    line_number: usize,
    line: &str,
    lines_pending: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Directive {
    let mut cursor = Cursor::new(line);
    cursor.skip_whitespace();

    if cursor.is_at_end() {
        return Directive::Blank;
    }
    if cursor.match_keyword(COMMENT_KEYWORD) {
        return Directive::Comment;
    }

    if cursor.match_keyword(LINES_KEYWORD) {
        if !lines_pending {
            return Directive::Lines(None);
        }
        cursor.skip_whitespace();
        if !cursor.match_keyword("=") {
            return Directive::Lines(None);
        }
        cursor.skip_whitespace();
        return Directive::Lines(Some(get_unsigned_integer(line_number, &mut cursor, diagnostics)));
    }

    if cursor.match_keyword(ON_START_KEYWORD) {
        cursor.skip_whitespace();
        return match cursor.read_quoted_string() {
            Some(command) => Directive::OnStart(command),
            None => Directive::Unrecognized,
        };
    }

    if cursor.match_keyword(KEYCODE_KEYWORD) {
        cursor.skip_whitespace();
        let shortcut = get_shortcut(&mut cursor);
        cursor.skip_whitespace();
        return match parse_command(&mut cursor) {
            Some(command) => Directive::Binding { shortcut, command },
            None => Directive::Unrecognized,
        };
    }

    Directive::Unrecognized
}

/// `restart`, `exit` или строка в разделителях
fn parse_command(cursor: &mut Cursor<'_>) -> Option<Command> {
    if cursor.match_keyword(RESTART_KEYWORD) {
        Some(Command::Restart)
    } else if cursor.match_keyword(EXIT_KEYWORD) {
        Some(Command::Exit)
    } else {
        cursor.read_quoted_string().map(Command::Shell)
    }
}

fn match_modifier(cursor: &mut Cursor<'_>) -> Option<ModifierMask> {
    ModifierMask::NAMED
        .iter()
        .find(|(name, _)| cursor.match_keyword(name))
        .map(|(_, mask)| *mask)
}

/// Разбирает `<keycode>[+<Modifier>]*` (модификаторы могут идти и перед кодом).
///
/// Незнакомое слово завершает разбор. `+` поглощается вместе со следующими
/// пробелами, даже если за ним ничего не распознано. Если код клавиши не прочитан, возвращается [`Shortcut::UNBOUND`], а курсор остаётся
/// на месте.
pub fn get_shortcut(cursor: &mut Cursor<'_>) -> Shortcut {
    let mut lookahead = *cursor;
    let mut committed = *cursor;
    let mut keycode: Option<u32> = None;
    let mut modifiers = ModifierMask::NONE;

    loop {
        lookahead.skip_whitespace();
        match lookahead.peek() {
            Some(b'0'..=b'9') if keycode.is_none() => {
                let mut value: u32 = 0;
                while let Some(digit @ b'0'..=b'9') = lookahead.peek() {
                    value = value
                        .saturating_mul(10)
                        .saturating_add(u32::from(digit - b'0'));
                    lookahead.bump();
                }
                keycode = Some(value);
            }
            _ => match match_modifier(&mut lookahead) {
                Some(mask) => modifiers |= mask,
                None => break,
            },
        }

        committed = lookahead;
        lookahead.skip_whitespace();
        if lookahead.peek() != Some(b'+') {
            break;
        }
        lookahead.bump();
        lookahead.skip_whitespace();
        committed = lookahead;
    }

    match keycode {
        Some(code) if code != Shortcut::UNBOUND.keycode.value() => {
            *cursor = committed;
            Shortcut::new(code, modifiers)
        }
        _ => Shortcut::UNBOUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::command_runner::testing::RecordingCommandRunner;
    use crate::settings::Settings;
    use std::io::Cursor as Reader;

    fn compiler() -> ShortcutCompiler {
        ShortcutCompiler::new(&Settings::default().parser)
    }

    fn compile(text: &str) -> (ScanReport, ShortcutTable, RecordingCommandRunner) {
        let runner = RecordingCommandRunner::default();
        let compiler = compiler();
        let report = compiler.scan(Reader::new(text.as_bytes()), &runner).unwrap();
        let table = compiler.build(Reader::new(text.as_bytes()), &report).unwrap();
        (report, table, runner)
    }

    fn shortcut_of(text: &str) -> (Shortcut, usize) {
        let mut cursor = Cursor::new(text);
        let shortcut = get_shortcut(&mut cursor);
        (shortcut, cursor.position())
    }

    #[test]
    fn test_scan_matches_build() {
        let text = "\
# comment
keycode 38+Mod4 \"xterm\"
keycode 39 'firefox --private-window'
keycode 9+Control+Shift exit
keycode 27 restart
";
        let (report, table, _) = compile(text);

        assert_eq!(report.shortcut_amount, 4);
        assert_eq!(table.len(), report.shortcut_amount);
        assert_eq!(report.max_command_length, "firefox --private-window".len());
        assert_eq!(table.max_command_length(), report.max_command_length);
        assert!(report.diagnostics.is_empty());

        assert_eq!(
            table.get(2).unwrap().shortcut,
            Shortcut::new(9, ModifierMask::CONTROL | ModifierMask::SHIFT)
        );
        assert_eq!(table.get(2).unwrap().command, Command::Exit);
        assert_eq!(table.get(3).unwrap().command, Command::Restart);
    }

    #[test]
    fn test_n_commands_produce_n_entries() {
        let text: String = (10..25)
            .map(|keycode| format!("keycode {} \"echo {}\"\n", keycode, keycode))
            .collect();
        let (report, table, _) = compile(&text);
        assert_eq!(report.shortcut_amount, 15);
        assert_eq!(table.len(), 15);
        for (index, binding) in table.iter().enumerate() {
            assert_eq!(binding.shortcut.keycode.value(), 10 + index as u32);
        }
    }

    #[test]
    fn test_duplicate_shortcuts_both_stored() {
        let text = "keycode 38 \"first\"\nkeycode 38 \"second\"\n";
        let (_, table, _) = compile(text);
        assert_eq!(table.len(), 2);

        let event = crate::events::KeyPress::new(38, ModifierMask::NONE);
        assert_eq!(table.find(&event).unwrap().command, Command::Shell("first".into()));
    }

    #[test]
    fn test_repeated_restart_counted_once() {
        let text = "keycode 1 restart\nkeycode 2 restart \"should not run\"\nkeycode 3 \"ok\"\n";
        let (report, table, runner) = compile(text);

        assert_eq!(report.shortcut_amount, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).unwrap().command, Command::Restart);
        assert_eq!(table.get(1).unwrap().command, Command::Shell("ok".into()));
        assert!(runner.commands().is_empty());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_repeated_exit_does_not_affect_length() {
        let text = "keycode 1 exit\nkeycode 2 exit\nkeycode 3 \"ab\"\n";
        let (report, table, _) = compile(text);
        assert_eq!(report.shortcut_amount, 2);
        assert_eq!(report.max_command_length, EXIT_KEYWORD.len());
        assert_eq!(table.max_command_length(), EXIT_KEYWORD.len());
    }

    #[test]
    fn test_unrecognized_line_single_diagnostic() {
        let text = "keycode 10 \"a\"\nfoo bar\nkeycode 11 \"b\"\n";
        let (report, table, _) = compile(text);

        assert_eq!(report.shortcut_amount, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::DirectiveWarning {
                line: 2,
                text: "foo bar".to_string()
            }]
        );
    }

    #[test]
    fn test_blank_and_comment_lines_are_silent() {
        let text = "\n   \n\t\n# keycode 9 exit\n   # indented comment\n";
        let (report, table, _) = compile(text);
        assert_eq!(report.shortcut_amount, 0);
        assert!(table.is_empty());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_lines_budget_uses_arithmetic() {
        let mut text = String::from("lines = 2+3*4\n");
        for keycode in 10..40 {
            text.push_str(&format!("keycode {} \"x\"\n", keycode));
        }
        let (report, table, _) = compile(&text);
        // Строки 2..=14 читаются, остальные за пределами бюджета
        assert_eq!(report.shortcut_amount, 13);
        assert_eq!(table.len(), 13);
    }

    #[test]
    fn test_lines_budget_follows_pending_factor_rule() {
        let mut text = String::from("LINES=1+0*5\n");
        for keycode in 10..20 {
            text.push_str(&format!("keycode {} \"x\"\n", keycode));
        }
        let (report, _, _) = compile(&text);
        assert_eq!(report.shortcut_amount, 4);
    }

    #[test]
    fn test_lines_first_occurrence_wins() {
        let text = "lines = 3\nlines = 100\nkeycode 10 \"a\"\nkeycode 11 \"b\"\n";
        let (report, _, _) = compile(text);
        // Второй `lines` молча игнорируется, бюджет 3 строки
        assert_eq!(report.shortcut_amount, 1);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_lines_without_equals_does_not_consume_override() {
        let text = "lines 1\nlines = 3\nkeycode 10 \"a\"\nkeycode 11 \"b\"\n";
        let (report, _, _) = compile(text);
        assert_eq!(report.shortcut_amount, 1);
    }

    #[test]
    fn test_negative_lines_reported_and_clamped() {
        let text = "lines = 2-5\nkeycode 10 \"a\"\n";
        let (report, table, _) = compile(text);
        assert_eq!(report.shortcut_amount, 0);
        assert!(table.is_empty());
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::ArithmeticUnderflow { line: 1, value: -3 }]
        );
    }

    #[test]
    fn test_default_line_budget_from_settings() {
        let mut settings = Settings::default().parser;
        settings.default_lines = 2;
        let compiler = ShortcutCompiler::new(&settings);
        let text = "keycode 10 \"a\"\nkeycode 11 \"b\"\nkeycode 12 \"c\"\n";
        let report = compiler
            .scan(Reader::new(text.as_bytes()), &RecordingCommandRunner::default())
            .unwrap();
        assert_eq!(report.shortcut_amount, 2);
    }

    #[test]
    fn test_on_start_runs_during_scan_only() {
        let text = "onStart \"picom --daemon\"\nonstart|xsetroot -solid grey|\nkeycode 9 exit\n";
        let (report, table, runner) = compile(text);
        assert_eq!(runner.commands(), vec!["picom --daemon", "xsetroot -solid grey"]);
        assert_eq!(report.shortcut_amount, 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_on_start_without_command_is_unrecognized() {
        let (report, _, runner) = compile("onStart   \n");
        assert!(runner.commands().is_empty());
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn test_keycode_without_action_is_unrecognized() {
        let (report, table, _) = compile("keycode 38+Mod4\n");
        assert_eq!(report.shortcut_amount, 0);
        assert!(table.is_empty());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].line(), 1);
    }

    #[test]
    fn test_keycode_without_number_is_unbound() {
        let (report, table, _) = compile("keycode \"orphan\"\n");
        assert_eq!(report.shortcut_amount, 1);
        assert_eq!(table.get(0).unwrap().shortcut, Shortcut::UNBOUND);
        assert_eq!(table.bound_shortcuts().count(), 0);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let (_, table, _) = compile("KEYCODE 24+control+MOD1 EXIT\n");
        let binding = table.get(0).unwrap();
        assert_eq!(binding.shortcut, Shortcut::new(24, ModifierMask::CONTROL | ModifierMask::MOD1));
        assert_eq!(binding.command, Command::Exit);
    }

    #[test]
    fn test_misaligned_build_detected() {
        let compiler = compiler();
        let runner = RecordingCommandRunner::default();
        let report = compiler
            .scan(Reader::new(&b"keycode 10 \"a\"\n"[..]), &runner)
            .unwrap();
        let result = compiler.build(Reader::new(&b"keycode 10 \"a\"\nkeycode 11 \"b\"\n"[..]), &report);
        assert!(matches!(result, Err(MicrorunError::Misaligned { .. })));
    }

    #[test]
    fn test_long_line_truncated_before_parsing() {
        let mut settings = Settings::default().parser;
        settings.line_width = 16;
        let compiler = ShortcutCompiler::new(&settings);
        let text = "keycode 10 \"abcdefghijklmnop\"\n";
        let runner = RecordingCommandRunner::default();
        let report = compiler.scan(Reader::new(text.as_bytes()), &runner).unwrap();
        let table = compiler.build(Reader::new(text.as_bytes()), &report).unwrap();
        // "keycode 10 \"abcd" - закрывающая кавычка отрезана
        assert_eq!(table.get(0).unwrap().command, Command::Shell("abcd".into()));
    }

    #[test]
    fn test_get_shortcut_keycode_and_modifiers() {
        let (shortcut, position) = shortcut_of("38 + Shift+Mod4 \"cmd\"");
        assert_eq!(shortcut, Shortcut::new(38, ModifierMask::SHIFT | ModifierMask::MOD4));
        assert_eq!(position, 15);
    }

    #[test]
    fn test_get_shortcut_modifier_first() {
        let (shortcut, _) = shortcut_of("Control+38 exit");
        assert_eq!(shortcut, Shortcut::new(38, ModifierMask::CONTROL));
    }

    #[test]
    fn test_get_shortcut_unknown_modifier_stops() {
        let (shortcut, position) = shortcut_of("38+Hyper \"cmd\"");
        assert_eq!(shortcut, Shortcut::new(38, ModifierMask::NONE));
        // `+` поглощён, разбор остановился на незнакомом слове
        assert_eq!(position, 3);
    }

    #[test]
    fn test_trailing_plus_does_not_become_delimiter() {
        let (shortcut, position) = shortcut_of("38+ exit");
        assert_eq!(shortcut, Shortcut::new(38, ModifierMask::NONE));
        assert_eq!(position, 4);

        let mut diagnostics = Vec::new();
        assert_eq!(
            parse_line(1, "keycode 38+ exit", true, &mut diagnostics),
            Directive::Binding {
                shortcut: Shortcut::new(38, ModifierMask::NONE),
                command: Command::Exit,
            }
        );
        assert_eq!(
            parse_line(2, "keycode 38+Mod4+  \"xterm\"", true, &mut diagnostics),
            Directive::Binding {
                shortcut: Shortcut::new(38, ModifierMask::MOD4),
                command: Command::Shell("xterm".into()),
            }
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_get_shortcut_without_keycode() {
        let (shortcut, position) = shortcut_of("Control \"cmd\"");
        assert_eq!(shortcut, Shortcut::UNBOUND);
        assert_eq!(position, 0);

        let (shortcut, position) = shortcut_of("0 exit");
        assert_eq!(shortcut, Shortcut::UNBOUND);
        assert_eq!(position, 0);
    }

    #[test]
    fn test_get_shortcut_second_number_stops() {
        let (shortcut, position) = shortcut_of("5+6 exit");
        assert_eq!(shortcut, Shortcut::new(5, ModifierMask::NONE));
        assert_eq!(position, 2);
    }
}
