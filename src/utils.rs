//! Utility functions.

/// Returns the NUL-terminated string starting at `offset` in a string table,
/// without its terminator. `None` if the offset is past the table or the
/// string is unterminated.
pub fn c_str_at(table: &[u8], offset: usize) -> Option<&[u8]> {
    let tail = table.get(offset..)?;
    let len = tail.iter().position(|&b| b == 0)?;
    Some(&tail[..len])
}

/// Aligns `value` up to the next multiple of `align`.
/// `align` must be a power of two.
pub fn align_up(value: usize, align: usize) -> usize {
    assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}
