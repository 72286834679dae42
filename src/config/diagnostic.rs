use thiserror::Error;

/// Некритичные замечания компилятора конфига.
/// Строка пропускается или значение подменяется, разбор продолжается.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("строка {line}: \"{text}\" не распознана как директива")]
    DirectiveWarning { line: usize, text: String },

    #[error("строка {line}: {value} не является беззнаковым целым, используется 0")]
    ArithmeticUnderflow { line: usize, value: i64 },
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Diagnostic::DirectiveWarning { line, .. } => *line,
            Diagnostic::ArithmeticUnderflow { line, .. } => *line,
        }
    }
}
