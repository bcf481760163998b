//! Joining completed writer chunks.

/// Concatenates a list of byte slices into a new vector.
///
/// # Example
///
/// ```
/// use packwire_buffers::concat_list;
///
/// let result = concat_list(&[&[1, 2][..], &[3, 4][..], &[5][..]]);
/// assert_eq!(result, vec![1, 2, 3, 4, 5]);
/// ```
pub fn concat_list(list: &[&[u8]]) -> Vec<u8> {
    let total_size: usize = list.iter().map(|s| s.len()).sum();
    let mut res = Vec::with_capacity(total_size);
    for item in list {
        res.extend_from_slice(item);
    }
    res
}

/// Converts a list of chunks into one contiguous vector, skipping the
/// concatenation pass when there is at most one chunk.
///
/// ```
/// use packwire_buffers::list_to_uint8;
///
/// assert_eq!(list_to_uint8(&[]), Vec::<u8>::new());
/// assert_eq!(list_to_uint8(&[&[1, 2][..]]), vec![1, 2]);
/// assert_eq!(list_to_uint8(&[&[1][..], &[2][..]]), vec![1, 2]);
/// ```
pub fn list_to_uint8(list: &[&[u8]]) -> Vec<u8> {
    match list {
        [] => Vec::new(),
        [single] => single.to_vec(),
        _ => concat_list(list),
    }
}
