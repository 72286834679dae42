//! Компилятор текстового конфига горячих клавиш.
//!
//! ConfigSource -> LineScanner -> Lexer/арифметика -> ShortcutCompiler (Scan, Build)
//! -> ShortcutTable.

pub mod arithmetic;
pub mod compiler;
pub mod diagnostic;
pub mod lexer;
pub mod scanner;
pub mod source;

pub use compiler::ShortcutCompiler;
pub use source::ConfigSource;
