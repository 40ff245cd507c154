/// Split decoded log text into numbered lines.
///
/// Lines end with `\n`, `\r\n` or a lone `\r`. A last line without terminator
/// is still yielded, while the empty remainder after a final terminator is not.
/// Blank lines are kept so that line numbers match the uploaded file; the
/// record decoder skips them.
pub fn frame(text: &str) -> impl Iterator<Item = (usize, &str)> + Clone {
    Lines { rest: text }
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
}

#[derive(Clone)]
struct Lines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        let Some(end) = self.rest.find(['\n', '\r']) else {
            return Some(std::mem::take(&mut self.rest));
        };

        let line = &self.rest[..end];
        let terminator = if self.rest[end..].starts_with("\r\n") { 2 } else { 1 };
        self.rest = &self.rest[end + terminator..];
        Some(line)
    }
}
