/// Longest file name most Unix filesystems accept, in bytes.
const NAME_MAX: usize = 255;

/// Makes `name` safe to use as a single path component.
///
/// Separators, NUL and control characters become `_`. Leading dots and
/// surrounding whitespace are stripped so the result is never hidden, `.` or
/// `..`. Output is cut to `NAME_MAX` bytes on a char boundary.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim().trim_start_matches('.').trim_end_matches(['.', ' ']);
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_controls_are_replaced() {
        assert_eq!(sanitize_filename("a/b\\c\u{7}.txt"), "a_b_c_.txt");
    }

    #[test]
    fn dots_cannot_escape_directory() {
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(" report.pdf. "), "report.pdf");
    }

    #[test]
    fn long_names_are_cut_on_char_boundary() {
        let name = "é".repeat(200);
        let out = sanitize_filename(&name);
        assert!(out.len() <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
