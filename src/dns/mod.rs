pub mod common;
pub mod constants;
pub mod edns;
pub mod enums;
pub mod header;
pub mod presentation;
pub mod question;
pub mod rdata;
pub mod resource;

use bitstream_io::{BigEndian, BitReader, BitWriter};
use common::PacketComponent;
use edns::EdnsOpt;
use enums::{DNSResourceClass, DNSResourceType};
use header::DNSHeader;
use question::DNSQuestion;
use resource::DNSResource;
use tracing::{debug, trace};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub resources: Vec<DNSResource>,
    /// EDNS0 OPT record if present (extracted from additional records)
    pub edns: Option<EdnsOpt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidHeader,
    InvalidLabel,
    NameTooLong,
    CompressionLoop,
    InvalidRdata(String),
    InvalidBitStream(String),
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::InvalidBitStream(e.to_string())
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidHeader => write!(f, "Invalid DNS header"),
            ParseError::InvalidLabel => write!(f, "Invalid DNS label"),
            ParseError::NameTooLong => write!(f, "DNS name too long"),
            ParseError::CompressionLoop => write!(f, "DNS compression loop detected"),
            ParseError::InvalidRdata(e) => write!(f, "Invalid RDATA: {}", e),
            ParseError::InvalidBitStream(e) => write!(f, "Invalid bit stream: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

impl DNSPacket {
    /// Build a recursive query for `domain` that asks the resolver for its
    /// DNSSEC material: RD and AD set in the header, EDNS0 with the DO bit.
    pub fn dnssec_query(id: u16, domain: &str, payload_size: u16) -> Self {
        let mut packet = DNSPacket {
            header: DNSHeader {
                id,
                rd: true,
                ad: true,
                qdcount: 1,
                ..Default::default()
            },
            questions: vec![DNSQuestion::new(
                domain,
                DNSResourceType::A,
                DNSResourceClass::IN,
            )],
            ..Default::default()
        };
        packet.add_edns(payload_size, true);
        packet
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        trace!("Parsing DNS packet, size: {} bytes", buf.len());
        if buf.len() < header::HEADER_LEN {
            return Err(ParseError::InvalidHeader);
        }
        let mut reader = BitReader::<_, BigEndian>::new(buf);
        let mut packet = DNSPacket::default();
        packet.header.read(&mut reader)?;
        debug!(
            "Parsed DNS header: id={}, qr={}, rcode={}, answers={}",
            packet.header.id, packet.header.qr, packet.header.rcode, packet.header.ancount
        );
        for _ in 0..packet.header.qdcount {
            let mut question = DNSQuestion::default();
            question.read_with_buffer(&mut reader, buf)?;
            packet.questions.push(question);
        }

        for _ in 0..packet.header.ancount {
            let mut answer = DNSResource::default();
            answer.read_with_buffer(&mut reader, buf)?;
            packet.answers.push(answer);
        }

        for _ in 0..packet.header.nscount {
            let mut authority = DNSResource::default();
            authority.read_with_buffer(&mut reader, buf)?;
            packet.authorities.push(authority);
        }

        for _ in 0..packet.header.arcount {
            let mut resource = DNSResource::default();
            resource.read_with_buffer(&mut reader, buf)?;

            // The OPT pseudo-record lives at the root and carries the payload
            // size in its class field
            if resource.rtype == DNSResourceType::OPT && resource.labels.is_empty() {
                match EdnsOpt::parse_from_resource(resource.raw_class, resource.ttl, &resource.rdata)
                {
                    Ok(edns_opt) => {
                        debug!("Parsed EDNS0 record: {}", edns_opt.debug_info());
                        packet.edns = Some(edns_opt);
                        continue;
                    }
                    Err(e) => {
                        debug!("Failed to parse EDNS OPT record: {:?}", e);
                    }
                }
            }

            packet.resources.push(resource);
        }

        Ok(packet)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ParseError> {
        let mut buf = Vec::new();
        let mut writer: BitWriter<&mut Vec<u8>, BigEndian> = BitWriter::new(&mut buf);

        let mut header = self.header.clone();
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authorities.len() as u16;
        header.arcount = self.resources.len() as u16 + u16::from(self.edns.is_some());

        header.write(&mut writer)?;

        for question in self.questions.iter() {
            question.write(&mut writer)?;
        }

        for answer in self.answers.iter() {
            answer.write(&mut writer)?;
        }

        for authority in self.authorities.iter() {
            authority.write(&mut writer)?;
        }

        for resource in self.resources.iter() {
            resource.write(&mut writer)?;
        }

        if let Some(edns) = &self.edns {
            edns.to_resource().write(&mut writer)?;
        }

        Ok(buf)
    }

    /// Add or update EDNS support in the packet
    pub fn add_edns(&mut self, payload_size: u16, do_flag: bool) {
        let mut edns = EdnsOpt::with_payload_size(payload_size);
        edns.set_do_flag(do_flag);
        self.edns = Some(edns);
    }

    /// Number of records in the additional section as seen on the wire,
    /// including the OPT pseudo-record
    pub fn additional_count(&self) -> usize {
        self.resources.len() + usize::from(self.edns.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dnssec_query_sets_do_and_ad() {
        let query = DNSPacket::dnssec_query(0x1234, "example.com", 1232);
        assert!(query.header.rd);
        assert!(query.header.ad);
        assert!(!query.header.qr);
        assert!(query.edns.as_ref().is_some_and(|edns| edns.do_flag()));
        assert_eq!(query.questions[0].name(), "example.com.");
        assert_eq!(query.questions[0].qtype, DNSResourceType::A);
    }

    #[test]
    fn test_query_wire_layout() {
        let bytes = DNSPacket::dnssec_query(0xabcd, "example.com", 1232)
            .serialize()
            .unwrap();

        // id, then RD (0x01) and AD (0x20) in the flag bytes
        assert_eq!(&bytes[0..4], &[0xab, 0xcd, 0x01, 0x20]);
        // qdcount=1, ancount=0, nscount=0, arcount=1 (OPT)
        assert_eq!(&bytes[4..12], &[0, 1, 0, 0, 0, 0, 0, 1]);
        // question name, type A, class IN
        assert_eq!(&bytes[12..25], b"\x07example\x03com\x00");
        assert_eq!(&bytes[25..29], &[0, 1, 0, 1]);
        // OPT: root owner, type 41, payload 1232, DO bit in the TTL field
        assert_eq!(&bytes[29..40], &[0, 0, 41, 0x04, 0xd0, 0, 0, 0x80, 0, 0, 0]);
        assert_eq!(bytes.len(), 40);
    }

    #[test]
    fn test_parse_extracts_edns() {
        let bytes = DNSPacket::dnssec_query(7, "example.org", 4096)
            .serialize()
            .unwrap();
        let parsed = DNSPacket::parse(&bytes).unwrap();

        assert!(parsed.resources.is_empty());
        assert_eq!(parsed.additional_count(), 1);
        let edns = parsed.edns.expect("OPT record should be extracted");
        assert_eq!(edns.udp_payload_size, 4096);
        assert!(edns.do_flag());
    }

    #[test]
    fn test_parse_rejects_short_buffer() {
        assert_eq!(DNSPacket::parse(&[0u8; 5]), Err(ParseError::InvalidHeader));
    }
}
