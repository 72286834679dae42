//! Целочисленные выражения для `lines = <expr>`.
//!
//! Рекурсивный спуск по десятичным литералам, `+ - * /` и скобкам.
//!
//! ВНИМАНИЕ: вычислитель хранит не более одного отложенного мультипликативного
//! множителя. Результат `*`/`/` держится отдельно от суммы и добавляется
//! (или вычитается) только на следующем `+`/`-` или в конце выражения.
//! Множитель, равный нулю, неотличим от "множителя нет", поэтому, например,
//! `1+0*5` даёт 5, а не 1. Значения `lines =` в существующих конфигах
//! зависят от этого поведения.

use super::diagnostic::Diagnostic;
use super::lexer::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    None,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'+' => Some(Operation::Add),
            b'-' => Some(Operation::Subtract),
            b'*' => Some(Operation::Multiply),
            b'/' => Some(Operation::Divide),
            _ => None,
        }
    }

    fn is_multiplicative(self) -> bool {
        matches!(self, Operation::Multiply | Operation::Divide)
    }

    fn combine(self, left: i64, right: i64) -> i64 {
        match self {
            Operation::Multiply => left.wrapping_mul(right),
            // Деление на ноль даёт 0 для этого слагаемого
            Operation::Divide => left.checked_div(right).unwrap_or(0),
            Operation::Add => left.wrapping_add(right),
            Operation::Subtract => left.wrapping_sub(right),
            Operation::None => left,
        }
    }
}

/// Состояние одного (возможно вложенного) выражения
#[derive(Debug)]
struct Accumulator {
    total: i64,
    operand: i64,
    pending: i64,
    pending_sign: Operation,
    operation: Operation,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            total: 0,
            operand: 0,
            pending: 0,
            pending_sign: Operation::None,
            operation: Operation::None,
        }
    }

    fn push_digit(&mut self, digit: u8) {
        self.operand = self
            .operand
            .wrapping_mul(10)
            .wrapping_add(i64::from(digit - b'0'));
    }

    /// Переносит отложенный множитель в сумму со знаком, который его открыл
    fn fold_pending(&mut self) {
        self.total = self.pending_sign.combine(self.total, self.pending);
    }

    fn apply(&mut self, next: Operation) {
        match self.operation {
            Operation::Add | Operation::Subtract => {
                if next.is_multiplicative() {
                    self.pending = self.operand;
                    self.pending_sign = self.operation;
                } else if self.pending == 0 {
                    self.total = self.operation.combine(self.total, self.operand);
                } else {
                    self.fold_pending();
                }
            }
            Operation::Multiply | Operation::Divide => {
                if self.pending == 0 {
                    self.total = self.operation.combine(self.total, self.operand);
                } else {
                    self.pending = self.operation.combine(self.pending, self.operand);
                }
                if !next.is_multiplicative() {
                    self.fold_pending();
                    self.pending = 0;
                }
            }
            Operation::None => {
                if self.total == 0 {
                    self.total = self.operand;
                }
            }
        }

        self.operation = next;
        self.operand = 0;
    }

    fn finish(mut self) -> i64 {
        match self.operation {
            Operation::Add | Operation::Subtract => {
                if self.pending > 0 {
                    self.fold_pending();
                }
                self.total = self.operation.combine(self.total, self.operand);
            }
            Operation::Multiply => {
                if self.pending == 0 {
                    self.total = self.operation.combine(self.total, self.operand);
                } else {
                    self.pending = self.operation.combine(self.pending, self.operand);
                    self.fold_pending();
                }
            }
            Operation::Divide => {
                if self.total > 0 || self.pending > 0 {
                    if self.pending == 0 {
                        self.total = self.operation.combine(self.total, self.operand);
                    } else {
                        self.pending = self.operation.combine(self.pending, self.operand);
                        self.fold_pending();
                    }
                }
            }
            Operation::None => {
                if self.total == 0 {
                    self.total = self.operand;
                }
            }
        }
        self.total
    }
}

/// Вычисляет знаковое выражение начиная с курсора.
///
/// Незнакомый символ завершает выражение без ошибки. `)` завершает текущее
/// (вложенное) выражение. `/` до первого операнда обрывает разбор сразу.
pub fn get_integer(cursor: &mut Cursor<'_>) -> i64 {
    let mut accumulator = Accumulator::new();

    while !cursor.is_at_end() {
        cursor.skip_whitespace();
        let Some(byte) = cursor.peek() else {
            break;
        };

        match byte {
            b'0'..=b'9' => {
                accumulator.push_digit(byte);
                cursor.bump();
            }
            b'(' => {
                cursor.bump();
                accumulator.operand = get_integer(cursor);
            }
            b')' => {
                cursor.bump();
                break;
            }
            _ => {
                let Some(next) = Operation::from_byte(byte) else {
                    break;
                };
                if next == Operation::Divide && accumulator.total == 0 && accumulator.operand == 0 {
                    break;
                }
                accumulator.apply(next);
                cursor.bump();
            }
        }
    }

    accumulator.finish()
}

/// То же, что [`get_integer`], но отрицательный результат заменяется нулём
/// с диагностикой для указанной строки.
pub fn get_unsigned_integer(
    line: usize,
    cursor: &mut Cursor<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> u64 {
    let value = get_integer(cursor);
    if value < 0 {
        diagnostics.push(Diagnostic::ArithmeticUnderflow { line, value });
        0
    } else {
        value as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str) -> i64 {
        get_integer(&mut Cursor::new(expression))
    }

    #[test]
    fn test_plain_literals() {
        assert_eq!(eval("42"), 42);
        assert_eq!(eval("  7  "), 7);
        assert_eq!(eval(""), 0);
    }

    #[test]
    fn test_addition_and_subtraction() {
        assert_eq!(eval("1+2+3"), 6);
        assert_eq!(eval("10 - 20"), -10);
        assert_eq!(eval("-3"), -3);
        assert_eq!(eval("5-5+3"), 3);
    }

    #[test]
    fn test_pending_factor_rule() {
        // 2, затем отложенный множитель 3*4 = 12, добавленный в конце
        assert_eq!(eval("2+3*4"), 14);
        assert_eq!(eval("1+2*3+4"), 11);
        assert_eq!(eval("2*3+4"), 10);
        assert_eq!(eval("1+6/2"), 4);
    }

    #[test]
    fn test_zero_pending_factor_deviation() {
        // Нулевой множитель не запоминается: 1*5 вместо 1+0*5
        assert_eq!(eval("1+0*5"), 5);
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(eval("(1+2)*3"), 9);
        assert_eq!(eval("2*(3+4)"), 14);
        // Незакрытая скобка закрывается концом строки
        assert_eq!(eval("(2"), 2);
    }

    #[test]
    fn test_unknown_character_ends_expression() {
        let mut cursor = Cursor::new("12 abc");
        assert_eq!(get_integer(&mut cursor), 12);
        assert_eq!(cursor.peek(), Some(b'a'));
    }

    #[test]
    fn test_closing_parenthesis_ends_top_level() {
        let mut cursor = Cursor::new("7) + 1");
        assert_eq!(get_integer(&mut cursor), 7);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_leading_division_terminates() {
        let mut cursor = Cursor::new("/5");
        assert_eq!(get_integer(&mut cursor), 0);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_whitespace_inside_literal() {
        assert_eq!(eval("1 2"), 12);
    }

    #[test]
    fn test_division_by_zero_yields_zero() {
        assert_eq!(eval("10/2"), 5);
        assert_eq!(eval("5/0"), 0);
    }

    #[test]
    fn test_unsigned_integer_underflow() {
        let mut diagnostics = Vec::new();
        let value = get_unsigned_integer(3, &mut Cursor::new("1-4"), &mut diagnostics);
        assert_eq!(value, 0);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::ArithmeticUnderflow { line: 3, value: -3 }]
        );
    }

    #[test]
    fn test_unsigned_integer_positive() {
        let mut diagnostics = Vec::new();
        let value = get_unsigned_integer(1, &mut Cursor::new("64"), &mut diagnostics);
        assert_eq!(value, 64);
        assert!(diagnostics.is_empty());
    }
}
