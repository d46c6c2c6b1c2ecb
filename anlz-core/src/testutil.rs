//! Hand-built ANLZ containers for tests
//!
//! Sections are big-endian: tag, header length, tag length, the rest of the
//! header, then the body.

/// Build one tag section; `header_rest` fills the header after the 12 common bytes
pub fn section(tag: &[u8; 4], header_rest: &[u8], body: &[u8]) -> Vec<u8> {
    let len_header = 12 + header_rest.len();
    let len_tag = len_header + body.len();

    let mut buffer = Vec::with_capacity(len_tag);
    buffer.extend_from_slice(tag);
    buffer.extend_from_slice(&(len_header as u32).to_be_bytes());
    buffer.extend_from_slice(&(len_tag as u32).to_be_bytes());
    buffer.extend_from_slice(header_rest);
    buffer.extend_from_slice(body);
    buffer
}

/// PWV4 color preview: 24-byte header, 6 bytes per entry
pub fn pwv4_section(entries: &[[u8; 6]]) -> Vec<u8> {
    let mut header = Vec::new();
    header.extend_from_slice(&6u32.to_be_bytes());
    header.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    header.extend_from_slice(&0u32.to_be_bytes());

    let body: Vec<u8> = entries.iter().flatten().copied().collect();
    section(b"PWV4", &header, &body)
}

/// PWAV / PWV2 preview: 20-byte header, 1 byte per entry
pub fn preview_section(tag: &[u8; 4], entries: &[u8]) -> Vec<u8> {
    let mut header = Vec::new();
    header.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    header.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    section(tag, &header, entries)
}

/// PPTH path section, UTF-16BE
pub fn ppth_section(path: &str) -> Vec<u8> {
    let utf16: Vec<u16> = path.encode_utf16().collect();
    let body: Vec<u8> = utf16.iter().flat_map(|c| c.to_be_bytes()).collect();
    section(b"PPTH", &(body.len() as u32).to_be_bytes(), &body)
}

/// Wrap sections in a 28-byte PMAI file header
pub fn container(sections: &[Vec<u8>]) -> Vec<u8> {
    let header_size = 28usize;
    let total_size = header_size + sections.iter().map(Vec::len).sum::<usize>();

    let mut buffer = Vec::with_capacity(total_size);
    buffer.extend_from_slice(b"PMAI");
    buffer.extend_from_slice(&(header_size as u32).to_be_bytes());
    buffer.extend_from_slice(&(total_size as u32).to_be_bytes());
    buffer.extend_from_slice(&[0u8; 16]);
    for section in sections {
        buffer.extend_from_slice(section);
    }
    buffer
}
