// `.cnet` grammar bundles: a binary container holding a grammar's
// vocabulary, rule names and serialized network.
//
// Layout (all integers little-endian):
//   bytes 0..4    cookie1
//   bytes 4..8    cookie2
//   bytes 8..10   format version (u16)
//   bytes 10..16  reserved, zero
//   string table: literal names    (u32 count, then NUL-terminated UTF-8)
//   string table: symbolic names
//   string table: rule names
//   padding to a 4-byte boundary
//   u32 word count, then the serialized network as i32 words

use crate::NetError;
use crate::interp::InterpFile;

const COOKIE1: u32 = 0x0002_CA7E;
const COOKIE2: u32 = 0x000C_0DE5;

/// Size of the bundle header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Current bundle format version.
pub const BUNDLE_VERSION: u16 = 1;

/// Parsed bundle header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleHeader {
    pub version: u16,
}

/// Parse and validate the 16-byte header.
pub fn parse_header(data: &[u8]) -> Result<BundleHeader, NetError> {
    if data.len() < HEADER_SIZE {
        return Err(NetError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let cookie1 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let cookie2 = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(NetError::InvalidMagic);
    }

    let version = u16::from_le_bytes([data[8], data[9]]);
    if version != BUNDLE_VERSION {
        return Err(NetError::UnsupportedBundleVersion(version));
    }
    Ok(BundleHeader { version })
}

/// Whether `data` starts with a bundle header.
pub fn is_bundle(data: &[u8]) -> bool {
    data.len() >= 8 && data[..4] == COOKIE1.to_le_bytes() && data[4..8] == COOKIE2.to_le_bytes()
}

/// Read a whole bundle.
pub fn read(data: &[u8]) -> Result<InterpFile, NetError> {
    parse_header(data)?;
    let mut pos = HEADER_SIZE;

    let (literal_names, next) = parse_string_table(data, pos)?;
    pos = next;
    let (symbolic_names, next) = parse_string_table(data, pos)?;
    pos = next;
    let (rule_names, next) = parse_string_table(data, pos)?;
    pos = next;
    let rule_names = rule_names
        .into_iter()
        .map(|n| n.ok_or_else(|| NetError::InvalidStringTable("empty rule name".to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    pos = align4(pos);
    let count = read_u32(data, pos)? as usize;
    pos += 4;

    let byte_len = count * size_of::<i32>();
    if pos + byte_len > data.len() {
        return Err(NetError::TooShort {
            expected: pos + byte_len,
            actual: data.len(),
        });
    }

    // The source slice may not be aligned for i32; copy into an owned buffer.
    let mut words = vec![0i32; count];
    bytemuck::cast_slice_mut::<i32, u8>(&mut words).copy_from_slice(&data[pos..pos + byte_len]);
    for word in &mut words {
        *word = i32::from_le(*word);
    }

    Ok(InterpFile {
        literal_names,
        symbolic_names,
        rule_names,
        words,
    })
}

/// Encode a bundle.
pub fn write(file: &InterpFile) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + file.words.len() * 4 + 256);
    out.extend_from_slice(&COOKIE1.to_le_bytes());
    out.extend_from_slice(&COOKIE2.to_le_bytes());
    out.extend_from_slice(&BUNDLE_VERSION.to_le_bytes());
    out.resize(HEADER_SIZE, 0);

    write_string_table(&mut out, file.literal_names.iter().map(|n| n.as_deref()));
    write_string_table(&mut out, file.symbolic_names.iter().map(|n| n.as_deref()));
    write_string_table(&mut out, file.rule_names.iter().map(|n| Some(n.as_str())));

    out.resize(align4(out.len()), 0);
    out.extend_from_slice(&(file.words.len() as u32).to_le_bytes());
    for word in &file.words {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out
}

fn align4(offset: usize) -> usize {
    let partial = offset % 4;
    if partial > 0 { offset + (4 - partial) } else { offset }
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32, NetError> {
    data.get(pos..pos + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(NetError::TooShort {
            expected: pos + 4,
            actual: data.len(),
        })
}

/// Parse a string table at `offset`. Empty entries stand for missing names.
///
/// Returns the entries and the offset just past the table.
fn parse_string_table(
    data: &[u8],
    offset: usize,
) -> Result<(Vec<Option<String>>, usize), NetError> {
    let count = read_u32(data, offset)? as usize;
    let mut pos = offset + 4;
    let mut entries = Vec::with_capacity(count.min(data.len()));

    for i in 0..count {
        let start = pos;
        while pos < data.len() && data[pos] != 0 {
            pos += 1;
        }
        if pos >= data.len() {
            return Err(NetError::InvalidStringTable(
                "unterminated string".to_string(),
            ));
        }
        let text = std::str::from_utf8(&data[start..pos])
            .map_err(|_| NetError::InvalidStringTable(format!("invalid UTF-8 in entry {i}")))?;
        pos += 1;
        entries.push((!text.is_empty()).then(|| text.to_string()));
    }
    Ok((entries, pos))
}

fn write_string_table<'a>(
    out: &mut Vec<u8>,
    entries: impl ExactSizeIterator<Item = Option<&'a str>>,
) {
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        out.extend_from_slice(entry.unwrap_or("").as_bytes());
        out.push(0);
    }
}
