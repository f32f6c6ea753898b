/// Last non-empty path segment of `url`, ignoring query and fragment.
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}
