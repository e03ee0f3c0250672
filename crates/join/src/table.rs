//! Table name resolution for structured keys.
//!
//! Keys are shaped `table|rest...`: the table name is the prefix before the
//! first `|`. Every pattern in a join must resolve a table from its literal
//! prefix alone, so that a change notification can be routed before any
//! slot is bound.

/// Returns the table-name prefix of a key, or `None` when the key has no
/// `|` delimiter or an empty prefix.
pub fn table_name(key: &[u8]) -> Option<&[u8]> {
    let pos = key.iter().position(|&b| b == b'|')?;
    if pos == 0 {
        None
    } else {
        Some(&key[..pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name() {
        assert_eq!(table_name(b"post|alice|017"), Some(&b"post"[..]));
        assert_eq!(table_name(b"t|"), Some(&b"t"[..]));
        assert_eq!(table_name(b"no delimiter"), None);
        assert_eq!(table_name(b"|leading"), None);
        assert_eq!(table_name(b""), None);
    }
}
