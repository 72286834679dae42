use std::io::{self, BufRead, ErrorKind};

/// Построчное чтение конфига с ограничением ширины строки.
///
/// Буфер строки переиспользуется: каждое чтение перезаписывает предыдущую
/// строку. Байты сверх `max_width` отбрасываются ещё при чтении, в памяти
/// держится не больше `max_width` байт строки.
pub struct LineScanner<R> {
    reader: R,
    max_width: usize,
    raw: Vec<u8>,
    line: String,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R, max_width: usize) -> Self {
        Self {
            reader,
            max_width,
            raw: Vec::new(),
            line: String::new(),
        }
    }

    /// Следующая строка без `\n`. `None` только когда поток исчерпан и
    /// строк больше нет; последняя строка без перевода строки тоже выдаётся.
    pub fn next_line(&mut self) -> io::Result<Option<&str>> {
        self.raw.clear();
        if !self.read_bounded()? {
            return Ok(None);
        }

        self.line.clear();
        self.line.push_str(&String::from_utf8_lossy(&self.raw));

        // Символ, разрезанный границей ширины, отбрасывается целиком
        let mut width = self.line.len().min(self.max_width);
        while !self.line.is_char_boundary(width) {
            width -= 1;
        }
        self.line.truncate(width);

        Ok(Some(self.line.as_str()))
    }

    /// Читает одну физическую строку, сохраняя не больше `max_width` байт.
    /// `false`, если поток уже исчерпан.
    fn read_bounded(&mut self) -> io::Result<bool> {
        let mut read_any = false;

        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(read_any);
            }
            read_any = true;

            let (chunk, newline) = match available.iter().position(|&byte| byte == b'\n') {
                Some(index) => (&available[..index], true),
                None => (available, false),
            };

            let room = self.max_width.saturating_sub(self.raw.len());
            self.raw.extend_from_slice(&chunk[..chunk.len().min(room)]);

            let consumed = chunk.len() + usize::from(newline);
            self.reader.consume(consumed);

            if newline {
                return Ok(true);
            }
        }
    }
}
