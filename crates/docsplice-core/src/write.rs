//! File writer: apply a splice plan in one pass, then persist atomically.

use crate::error::SpliceError;
use crate::model::SpliceOperation;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Apply insertions to `source`, left to right.
///
/// Offsets refer to the original text. The output is built in one pass:
/// untouched text is copied up to each offset, the insertion follows, and
/// the operation's `removed` bytes are skipped. Pure: the same input always
/// yields the same bytes.
pub fn apply(source: &str, operations: &[SpliceOperation]) -> Result<String, SpliceError> {
    let added: usize = operations.iter().map(|op| op.text.len()).sum();
    let mut output = String::with_capacity(source.len() + added);

    let mut cursor = 0;
    let mut previous: Option<usize> = None;
    for op in operations {
        if let Some(previous) = previous {
            if op.offset <= previous || op.offset < cursor {
                return Err(SpliceError::Unordered {
                    previous,
                    offset: op.offset,
                });
            }
        }
        let end = op.offset + op.removed;
        if end > source.len() {
            return Err(SpliceError::OutOfBounds {
                offset: end,
                len: source.len(),
            });
        }
        for at in [op.offset, end] {
            if !source.is_char_boundary(at) {
                return Err(SpliceError::NotCharBoundary { offset: at });
            }
        }

        output.push_str(&source[cursor..op.offset]);
        output.push_str(&op.text);
        cursor = end;
        previous = Some(op.offset);
    }
    output.push_str(&source[cursor..]);

    Ok(output)
}

/// Replace the file at `path` with `contents` via a sibling temp file and a
/// rename, so readers never observe a half-written file.
pub fn persist(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Some(permissions) = permissions {
        fs::set_permissions(tmp.path(), permissions)?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(offset: usize, text: &str) -> SpliceOperation {
        SpliceOperation {
            offset,
            removed: 0,
            text: text.to_string(),
            target: 0,
        }
    }

    #[test]
    fn applies_with_drift() {
        let out = apply("abc", &[op(0, "X"), op(1, "YY"), op(3, "Z")]).unwrap();
        assert_eq!(out, "XaYYbcZ");
    }

    #[test]
    fn no_operations_is_identity() {
        assert_eq!(apply("same\n", &[]).unwrap(), "same\n");
    }

    #[test]
    fn deterministic() {
        let ops = [op(2, "/** x */\n"), op(5, "!")];
        let first = apply("ab\ncd\n", &ops).unwrap();
        let second = apply("ab\ncd\n", &ops).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_unordered() {
        let err = apply("abc", &[op(2, "x"), op(1, "y")]).unwrap_err();
        assert_eq!(err, SpliceError::Unordered { previous: 2, offset: 1 });
        let err = apply("abc", &[op(1, "x"), op(1, "y")]).unwrap_err();
        assert_eq!(err, SpliceError::Unordered { previous: 1, offset: 1 });
    }

    #[test]
    fn replaces_removed_bytes() {
        let mut split = op(3, "\nX\n");
        split.removed = 2;
        let out = apply("ab;  cd", &[split, op(6, "!")]).unwrap();
        assert_eq!(out, "ab;\nX\nc!d");
    }

    #[test]
    fn rejects_insert_inside_removed_range() {
        let mut split = op(1, "x");
        split.removed = 3;
        let err = apply("abcdef", &[split, op(2, "y")]).unwrap_err();
        assert_eq!(err, SpliceError::Unordered { previous: 1, offset: 2 });
    }

    #[test]
    fn rejects_out_of_bounds() {
        let err = apply("abc", &[op(4, "x")]).unwrap_err();
        assert_eq!(err, SpliceError::OutOfBounds { offset: 4, len: 3 });
    }

    #[test]
    fn rejects_split_character() {
        let err = apply("é", &[op(1, "x")]).unwrap_err();
        assert_eq!(err, SpliceError::NotCharBoundary { offset: 1 });
    }

    #[test]
    fn persist_replaces_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.ts");
        fs::write(&path, "old\n").unwrap();
        persist(&path, "new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        // Only the target remains; the temp file was renamed over it.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
