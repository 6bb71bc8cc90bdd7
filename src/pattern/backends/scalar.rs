// Fri Oct 16 2026 - Alex

pub fn matches(data: &[u8], mask: &[u8], bytes: &[u8]) -> bool {
    data.iter()
        .zip(mask.iter())
        .zip(bytes.iter())
        .all(|((&d, &m), &b)| d & m == b)
}
