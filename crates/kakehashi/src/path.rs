//! Path utilities.
//!
//! Pure string functions: no I/O, no existence checks. Adapters resolve
//! caller paths with [`resolve_within_root`]; the façade splits virtual
//! paths with [`strip_prefix`].

use crate::error::{FsError, FsResult};

/// Delimiter between an adapter prefix and the adapter-relative path.
pub const DELIMITER: &str = "://";

/// Path separator convention of a backend namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Unix and SFTP style `/`.
    Slash,
    /// Windows style `\`.
    Backslash,
}

impl Separator {
    /// The separator character.
    pub fn as_char(self) -> char {
        match self {
            Separator::Slash => '/',
            Separator::Backslash => '\\',
        }
    }

    fn is_separator(self, c: char) -> bool {
        // `/` is accepted by both conventions; `\` is a legal name byte on unix.
        c == '/' || (self == Separator::Backslash && c == '\\')
    }
}

/// Detect the separator convention of a root path.
///
/// Drive-letter roots (`C:`) and roots using only backslashes are treated as
/// Windows paths; everything else uses `/`.
pub fn detect_separator(root: &str) -> Separator {
    let bytes = root.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if drive || (root.contains('\\') && !root.contains('/')) {
        Separator::Backslash
    } else {
        Separator::Slash
    }
}

/// Split a path into its segments, dropping empty and `.` segments.
///
/// `..` segments are kept verbatim.
pub fn split_segments(path: &str, separator: Separator) -> Vec<&str> {
    path.split(|c: char| separator.is_separator(c))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Join segments with the given separator.
pub fn join(segments: &[&str], separator: Separator) -> String {
    let mut out = String::new();
    for segment in segments {
        if !out.is_empty() && !out.ends_with(separator.as_char()) {
            out.push(separator.as_char());
        }
        out.push_str(segment);
    }
    out
}

/// Collapse repeated separators and `.` segments and resolve `..` lexically.
///
/// A `..` at the top of an absolute path is dropped; on a relative path it
/// is kept.
pub fn normalize(path: &str, separator: Separator) -> String {
    let absolute = path.starts_with(|c: char| separator.is_separator(c));
    let mut stack: Vec<&str> = Vec::new();
    for segment in split_segments(path, separator) {
        if segment != ".." {
            stack.push(segment);
        } else if stack.last().is_some_and(|last| *last != "..") {
            stack.pop();
        } else if !absolute {
            stack.push(segment);
        }
    }

    let joined = join(&stack, separator);
    if absolute {
        format!("{}{}", separator.as_char(), joined)
    } else {
        joined
    }
}

/// Join `relative` onto `root` using the root's separator convention.
///
/// Redundant separators and `.` segments are collapsed. `..` segments are
/// kept as-is; use [`resolve_within_root`] when containment matters.
pub fn prepend_root_path(root: &str, relative: &str) -> String {
    let separator = detect_separator(root);
    let sep = separator.as_char();

    let mut out = String::new();
    if root.starts_with(|c: char| separator.is_separator(c)) {
        out.push(sep);
    }
    for segment in split_segments(root, separator)
        .into_iter()
        .chain(split_segments(relative, separator))
    {
        if !out.is_empty() && !out.ends_with(sep) {
            out.push(sep);
        }
        out.push_str(segment);
    }

    // Bare drive ("C:") means the drive's current directory, not its root.
    if separator == Separator::Backslash && out.ends_with(':') {
        out.push(sep);
    }
    out
}

/// Lexically resolve `relative` and join it onto `root`.
///
/// `..` segments are applied against the segments before them. A `..` that
/// would climb above the root fails with [`FsError::InvalidPath`].
pub fn resolve_within_root(root: &str, relative: &str) -> FsResult<String> {
    let separator = detect_separator(root);
    let mut stack: Vec<&str> = Vec::new();
    for segment in split_segments(relative, separator) {
        if segment == ".." {
            if stack.pop().is_none() {
                return Err(FsError::invalid_path(relative, "path escapes adapter root"));
            }
        } else {
            stack.push(segment);
        }
    }
    Ok(prepend_root_path(root, &join(&stack, separator)))
}

/// Split a virtual path into `(prefix, relative)`.
///
/// Splits on the first [`DELIMITER`]. A path without a delimiter routes to
/// `default_prefix` when one is designated. The relative part always
/// borrows from `virtual_path`.
pub fn strip_prefix<'p, 'a: 'p>(
    virtual_path: &'a str,
    default_prefix: Option<&'p str>,
) -> FsResult<(&'p str, &'a str)> {
    match virtual_path.find(DELIMITER) {
        Some(0) => Err(FsError::invalid_path(virtual_path, "empty adapter prefix")),
        Some(idx) => Ok((
            &virtual_path[..idx],
            &virtual_path[idx + DELIMITER.len()..],
        )),
        None => match default_prefix {
            Some(prefix) => Ok((prefix, virtual_path)),
            None => Err(FsError::invalid_path(
                virtual_path,
                format!("missing '{}' delimiter and no default adapter", DELIMITER),
            )),
        },
    }
}

/// Build a virtual path from a prefix and an adapter-relative path.
pub fn to_virtual_path(prefix: &str, relative: &str) -> String {
    let relative = join(&split_segments(relative, Separator::Backslash), Separator::Slash);
    format!("{}{}{}", prefix, DELIMITER, relative)
}

/// Express an absolute backend path relative to `root`, with `/` separators.
///
/// Returns `None` when `absolute` does not lie under `root`.
pub fn relative_to_root(root: &str, absolute: &str) -> Option<String> {
    let separator = detect_separator(root);
    let root_segments = split_segments(root, separator);
    let segments = split_segments(absolute, separator);
    segments
        .strip_prefix(root_segments.as_slice())
        .map(|rest| join(rest, Separator::Slash))
}

/// Final segment of a path, ignoring trailing separators.
pub fn file_name(path: &str) -> &str {
    let separator = detect_separator(path);
    let trimmed = path.trim_end_matches(|c: char| separator.is_separator(c));
    trimmed
        .rsplit(|c: char| separator.is_separator(c))
        .next()
        .unwrap_or(trimmed)
}

/// Parent of an absolute path, or `None` at the root.
pub fn parent(path: &str) -> Option<String> {
    let separator = detect_separator(path);
    let segments = split_segments(path, separator);
    let (_, init) = segments.split_last()?;
    if init.is_empty() && !path.starts_with(|c: char| separator.is_separator(c)) {
        return None;
    }
    let mut out = String::new();
    if path.starts_with(|c: char| separator.is_separator(c)) {
        out.push(separator.as_char());
    }
    out.push_str(&join(init, separator));
    Some(out)
}
