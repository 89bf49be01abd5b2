use bitstream_io::{BitRead, BitReader, BitWrite, BitWriter, Endianness};

use super::ParseError;

/// Maximum wire length of a domain name (RFC 1035)
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum label length (RFC 1035)
pub const MAX_LABEL_LENGTH: usize = 63;

/// Compression pointers followed before a name is considered a loop
const MAX_POINTER_HOPS: usize = 16;

pub trait PacketComponent {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError>;
    fn read<E: Endianness>(&mut self, reader: &mut BitReader<&[u8], E>) -> Result<(), ParseError>;

    /// Read a possibly compressed owner name. Pointers are resolved against
    /// the whole packet, the reader only advances past the pointer itself.
    fn read_labels_with_buffer<E: Endianness>(
        &mut self,
        reader: &mut BitReader<&[u8], E>,
        packet_buf: &[u8],
    ) -> Result<Vec<String>, ParseError> {
        let mut labels = Vec::new();
        let mut wire_len = 1;
        loop {
            let label_len = reader.read_var::<u8>(8)?;
            match label_len & 0xC0 {
                0x00 if label_len == 0 => break,
                0x00 => {
                    wire_len += label_len as usize + 1;
                    if wire_len > MAX_NAME_LENGTH {
                        return Err(ParseError::NameTooLong);
                    }
                    let mut buf = vec![0; label_len as usize];
                    reader.read_bytes(&mut buf)?;
                    labels.push(String::from_utf8_lossy(&buf).into_owned());
                }
                0xC0 => {
                    let low = reader.read_var::<u8>(8)?;
                    let offset = (((label_len & 0x3F) as usize) << 8) | low as usize;
                    let (rest, _) = read_name(packet_buf, offset, packet_buf)?;
                    if wire_len + rest.iter().map(|l| l.len() + 1).sum::<usize>() > MAX_NAME_LENGTH
                    {
                        return Err(ParseError::NameTooLong);
                    }
                    labels.extend(rest);
                    break;
                }
                _ => return Err(ParseError::InvalidLabel),
            }
        }

        Ok(labels)
    }

    fn write_labels<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
        labels: &[String],
    ) -> Result<(), ParseError> {
        for label in labels.iter().filter(|l| !l.is_empty()) {
            if label.len() > MAX_LABEL_LENGTH {
                return Err(ParseError::InvalidLabel);
            }
            writer.write_var::<u8>(8, label.len() as u8)?;
            writer.write_bytes(label.as_bytes())?;
        }
        writer.write_var::<u8>(8, 0)?;

        Ok(())
    }
}

/// Decode a name starting at `start` in `data`, following compression
/// pointers into `packet`. Returns the labels and the offset in `data` just
/// past the name.
pub fn read_name(
    data: &[u8],
    start: usize,
    packet: &[u8],
) -> Result<(Vec<String>, usize), ParseError> {
    let mut labels = Vec::new();
    let mut source = data;
    let mut pos = start;
    let mut end = None;
    let mut hops = 0;
    let mut wire_len = 1;

    loop {
        let label_len = *source.get(pos).ok_or(ParseError::InvalidLabel)?;
        match label_len & 0xC0 {
            0x00 if label_len == 0 => {
                pos += 1;
                break;
            }
            0x00 => {
                let label_start = pos + 1;
                let label_end = label_start + label_len as usize;
                let bytes = source
                    .get(label_start..label_end)
                    .ok_or(ParseError::InvalidLabel)?;
                wire_len += label_len as usize + 1;
                if wire_len > MAX_NAME_LENGTH {
                    return Err(ParseError::NameTooLong);
                }
                labels.push(String::from_utf8_lossy(bytes).into_owned());
                pos = label_end;
            }
            0xC0 => {
                let low = *source.get(pos + 1).ok_or(ParseError::InvalidLabel)?;
                if end.is_none() {
                    end = Some(pos + 2);
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(ParseError::CompressionLoop);
                }
                source = packet;
                pos = (((label_len & 0x3F) as usize) << 8) | low as usize;
            }
            _ => return Err(ParseError::InvalidLabel),
        }
    }

    Ok((labels, end.unwrap_or(pos)))
}

/// Fully qualified presentation form of a label list
pub fn labels_to_fqdn(labels: &[String]) -> String {
    if labels.is_empty() {
        return ".".to_string();
    }
    let mut name = labels.join(".");
    name.push('.');
    name
}

/// Split a domain into labels, dropping the empty root label
pub fn domain_to_labels(domain: &str) -> Vec<String> {
    domain
        .split('.')
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
