use semver::Version;

/// Longest digit run accepted as a single version component.
const MAX_COMPONENT_DIGITS: usize = 16;

/// Extracts a `MAJOR[.MINOR[.PATCH]]` version from an arbitrary string.
///
/// The first digit run that is not glued to a longer number becomes the
/// major component; up to two following `.N` runs fill in minor and patch.
/// Missing components default to zero. Anything around the match (a leading
/// `v`, pre-release tags, build metadata, a fourth component) is dropped.
///
/// Returns `None` when the string contains no usable number.
///
/// # Example
///
/// ```
/// use lockguard::matcher::coerce;
///
/// assert_eq!(coerce("v1.2").unwrap().to_string(), "1.2.0");
/// assert_eq!(coerce("1.1.2-beta.1").unwrap().to_string(), "1.1.2");
/// assert!(coerce("not-a-version").is_none());
/// ```
pub fn coerce(input: &str) -> Option<Version> {
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if !bytes[pos].is_ascii_digit() {
            pos += 1;
            continue;
        }

        let run_end = digit_run_end(bytes, pos);
        if run_end - pos <= MAX_COMPONENT_DIGITS {
            let major: u64 = input[pos..run_end].parse().ok()?;
            let (minor, after_minor) = component_after(input, run_end);
            let patch = match minor {
                Some(_) => component_after(input, after_minor).0,
                None => None,
            };
            return Some(Version::new(major, minor.unwrap_or(0), patch.unwrap_or(0)));
        }

        pos = run_end;
    }

    None
}

fn digit_run_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(bytes.len(), |offset| start + offset)
}

/// Reads a `.N` component starting at `pos`, returning it together with the
/// position just past it. On failure the position is left unchanged.
fn component_after(input: &str, pos: usize) -> (Option<u64>, usize) {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&b'.') {
        return (None, pos);
    }

    let start = pos + 1;
    let end = digit_run_end(bytes, start);
    let len = end - start;
    if len == 0 || len > MAX_COMPONENT_DIGITS {
        return (None, pos);
    }

    match input[start..end].parse() {
        Ok(n) => (Some(n), end),
        Err(_) => (None, pos),
    }
}
