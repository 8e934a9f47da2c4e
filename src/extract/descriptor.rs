//! Scanning of field/method descriptors and generic signature strings
//! for the class internal names they mention.

use super::ExtractError;

/// Collect every class internal name appearing in a descriptor or a
/// generic `Signature` attribute string, in order of appearance.
///
/// For plain descriptors (`(Ljava/util/List;I)Lcom/example/Foo;`) the
/// scan is exact. Generic signatures reuse the same reference-type
/// syntax; type variables (`TT;`) are skipped, and the declaring part of
/// a nested generic type (`Lfoo/Outer<...>.Inner;`) is attributed to the
/// outer name.
pub(crate) fn class_names(descriptor: &str) -> Result<Vec<&str>, ExtractError> {
    let bytes = descriptor.as_bytes();
    let mut names = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'L' => {
                let start = pos + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end] != b';' && bytes[end] != b'<' {
                    end += 1;
                }
                if end >= bytes.len() || end == start {
                    return Err(ExtractError::InvalidDescriptor(descriptor.to_string()));
                }
                // Slicing on byte offsets is safe: ';' and '<' are ASCII.
                names.push(&descriptor[start..end]);
                pos = end + 1;
            }
            b'T' => {
                // Type-variable reference: skip to its ';' terminator.
                // Hitting ':' or '<' first means this 'T' starts a formal
                // parameter name (as in `<T:Ljava/lang/Object;>`), which
                // is not a reference.
                let mut end = pos + 1;
                while end < bytes.len() && !matches!(bytes[end], b';' | b':' | b'<') {
                    end += 1;
                }
                if end < bytes.len() && bytes[end] == b';' {
                    pos = end + 1;
                } else {
                    pos += 1;
                }
            }
            _ => pos += 1,
        }
    }

    Ok(names)
}
