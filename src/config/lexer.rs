/// Курсор по одной строке конфига.
///
/// Работает с байтами: синтаксис конфига целиком ASCII, а содержимое
/// команд копируется как есть.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    line: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            line: line.as_bytes(),
            position: 0,
        }
    }

    #[cfg(test)]
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.line.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.line.get(self.position).copied()
    }

    pub fn bump(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    /// Пропускает пробелы и табуляции
    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.position += 1;
        }
    }

    /// Регистронезависимое (ASCII) сравнение с ключевым словом.
    /// Курсор сдвигается только при совпадении.
    pub fn match_keyword(&mut self, keyword: &str) -> bool {
        let keyword = keyword.as_bytes();
        let rest = &self.line[self.position..];

        if rest.len() >= keyword.len() && rest[..keyword.len()].eq_ignore_ascii_case(keyword) {
            self.position += keyword.len();
            true
        } else {
            false
        }
    }

    /// Длина строки в разделителях, начиная с текущего символа.
    /// Курсор не сдвигается.
    pub fn quoted_string_len(&self) -> Option<usize> {
        let delimiter = self.peek()?;
        let length = self.line[self.position + 1..]
            .iter()
            .take_while(|&&byte| byte != delimiter)
            .count();
        Some(length)
    }

    /// Извлекает строку в разделителях: первый символ под курсором открывает
    /// строку, его повтор (или конец строки) закрывает.
    pub fn read_quoted_string(&mut self) -> Option<String> {
        let length = self.quoted_string_len()?;
        let start = self.position + 1;

        let mut text = String::with_capacity(length);
        text.push_str(&String::from_utf8_lossy(&self.line[start..start + length]));

        // Встаём за закрывающий разделитель, если он есть
        self.position = (start + length + 1).min(self.line.len());
        Some(text)
    }
}
