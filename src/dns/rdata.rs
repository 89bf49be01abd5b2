//! RDATA decoding into the presentation format used by zone files and dig.

use std::net::{Ipv4Addr, Ipv6Addr};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;

use super::{
    ParseError,
    common::{labels_to_fqdn, read_name},
    enums::DNSResourceType,
};

/// Render `rdata` of type `rtype`. Names inside RDATA may be compressed
/// against `packet`.
pub fn to_presentation(
    rtype: DNSResourceType,
    rdata: &[u8],
    packet: &[u8],
) -> Result<String, ParseError> {
    let mut fields = Fields::new(rdata, packet);
    let text = match rtype {
        DNSResourceType::A => {
            let octets: [u8; 4] = fields.take(4)?.try_into().map_err(|_| bad("A"))?;
            Ipv4Addr::from(octets).to_string()
        }
        DNSResourceType::AAAA => {
            let octets: [u8; 16] = fields.take(16)?.try_into().map_err(|_| bad("AAAA"))?;
            Ipv6Addr::from(octets).to_string()
        }
        DNSResourceType::NS
        | DNSResourceType::CNAME
        | DNSResourceType::PTR
        | DNSResourceType::DNAME => fields.name()?,
        DNSResourceType::MX => {
            let preference = fields.u16()?;
            format!("{} {}", preference, fields.name()?)
        }
        DNSResourceType::SOA => {
            let mname = fields.name()?;
            let rname = fields.name()?;
            format!(
                "{} {} {} {} {} {} {}",
                mname,
                rname,
                fields.u32()?,
                fields.u32()?,
                fields.u32()?,
                fields.u32()?,
                fields.u32()?
            )
        }
        DNSResourceType::TXT => {
            let mut strings = Vec::new();
            while !fields.is_empty() {
                strings.push(quote(fields.character_string()?));
            }
            strings.join(" ")
        }
        DNSResourceType::DS | DNSResourceType::CDS => {
            let key_tag = fields.u16()?;
            let algorithm = fields.u8()?;
            let digest_type = fields.u8()?;
            format!(
                "{} {} {} {}",
                key_tag,
                algorithm,
                digest_type,
                hex::encode_upper(fields.rest())
            )
        }
        DNSResourceType::DNSKEY | DNSResourceType::CDNSKEY => {
            let flags = fields.u16()?;
            let protocol = fields.u8()?;
            let algorithm = fields.u8()?;
            format!(
                "{} {} {} {}",
                flags,
                protocol,
                algorithm,
                BASE64.encode(fields.rest())
            )
        }
        DNSResourceType::RRSIG => {
            let type_covered = DNSResourceType::from(fields.u16()?);
            let algorithm = fields.u8()?;
            let labels = fields.u8()?;
            let original_ttl = fields.u32()?;
            let expiration = timestamp(fields.u32()?);
            let inception = timestamp(fields.u32()?);
            let key_tag = fields.u16()?;
            let signer = fields.name()?;
            format!(
                "{} {} {} {} {} {} {} {} {}",
                type_covered,
                algorithm,
                labels,
                original_ttl,
                expiration,
                inception,
                key_tag,
                signer,
                BASE64.encode(fields.rest())
            )
        }
        DNSResourceType::NSEC => {
            let next = fields.name()?;
            let types = type_bitmap(fields.rest())?;
            if types.is_empty() {
                next
            } else {
                format!("{} {}", next, types.join(" "))
            }
        }
        _ => return Ok(generic(rdata)),
    };

    if !fields.is_empty() && !matches!(rtype, DNSResourceType::TXT) {
        return Err(bad(&rtype.to_string()));
    }
    Ok(text)
}

/// RFC 3597 unknown-type form: `\# <length> <hex>`
pub fn generic(rdata: &[u8]) -> String {
    if rdata.is_empty() {
        return "\\# 0".to_string();
    }
    format!("\\# {} {}", rdata.len(), hex::encode_upper(rdata))
}

/// Decode an NSEC/NSEC3 type bitmap into mnemonics
pub fn type_bitmap(mut bitmap: &[u8]) -> Result<Vec<String>, ParseError> {
    let mut types = Vec::new();
    while !bitmap.is_empty() {
        if bitmap.len() < 2 {
            return Err(bad("type bitmap"));
        }
        let window = bitmap[0] as u16;
        let length = bitmap[1] as usize;
        let bits = bitmap.get(2..2 + length).ok_or_else(|| bad("type bitmap"))?;
        for (index, byte) in bits.iter().enumerate() {
            for bit in 0..8 {
                if byte & (0x80 >> bit) != 0 {
                    let code = window * 256 + (index as u16) * 8 + bit;
                    types.push(DNSResourceType::from(code).to_string());
                }
            }
        }
        bitmap = &bitmap[2 + length..];
    }
    Ok(types)
}

fn timestamp(secs: u32) -> String {
    DateTime::from_timestamp(secs as i64, 0)
        .map(|t| t.format("%Y%m%d%H%M%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn quote(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        match b {
            b'"' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\{:03}", b)),
        }
    }
    out.push('"');
    out
}

fn bad(what: &str) -> ParseError {
    ParseError::InvalidRdata(format!("malformed {} rdata", what))
}

/// Sequential reader over one record's RDATA
struct Fields<'a> {
    data: &'a [u8],
    packet: &'a [u8],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new(data: &'a [u8], packet: &'a [u8]) -> Self {
        Self {
            data,
            packet,
            pos: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        let slice = self
            .data
            .get(self.pos..self.pos + n)
            .ok_or_else(|| ParseError::InvalidRdata("rdata too short".to_string()))?;
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ParseError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ParseError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn name(&mut self) -> Result<String, ParseError> {
        let (labels, end) = read_name(self.data, self.pos, self.packet)?;
        self.pos = end;
        Ok(labels_to_fqdn(&labels))
    }

    fn character_string(&mut self) -> Result<&'a [u8], ParseError> {
        let len = self.u8()? as usize;
        self.take(len)
    }

    fn rest(&mut self) -> &'a [u8] {
        let rest = self.data.get(self.pos..).unwrap_or_default();
        self.pos = self.data.len();
        rest
    }
}
