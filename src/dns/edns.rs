use super::ParseError;
use super::enums::DNSResourceType;
use super::resource::DNSResource;

/// DNSSEC OK bit in the OPT flags field (RFC 3225)
const DO_BIT: u16 = 0x8000;

/// EDNS0 OPT pseudo-record implementation
/// RFC 6891: https://tools.ietf.org/html/rfc6891
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdnsOpt {
    /// UDP payload size that can be handled by the requestor
    pub udp_payload_size: u16,
    /// Extended RCODE (high 8 bits)
    pub extended_rcode: u8,
    /// EDNS version (currently 0)
    pub version: u8,
    /// EDNS flags (16 bits)
    pub flags: u16,
    pub options: Vec<EdnsOption>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

/// EDNS option codes that resolvers commonly attach to answers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdnsOptionCode {
    /// Name Server Identifier (RFC 5001)
    Nsid,
    /// Client Subnet (RFC 7871)
    ClientSubnet,
    /// DNS Cookies (RFC 7873)
    Cookie,
    /// TCP Keepalive (RFC 7828)
    TcpKeepalive,
    /// Padding (RFC 7830)
    Padding,
    /// Extended DNS Errors (RFC 8914)
    ExtendedError,
    Unknown(u16),
}

impl From<u16> for EdnsOptionCode {
    fn from(value: u16) -> Self {
        match value {
            3 => EdnsOptionCode::Nsid,
            8 => EdnsOptionCode::ClientSubnet,
            10 => EdnsOptionCode::Cookie,
            11 => EdnsOptionCode::TcpKeepalive,
            12 => EdnsOptionCode::Padding,
            15 => EdnsOptionCode::ExtendedError,
            x => EdnsOptionCode::Unknown(x),
        }
    }
}

impl std::fmt::Display for EdnsOptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdnsOptionCode::Nsid => write!(f, "NSID"),
            EdnsOptionCode::ClientSubnet => write!(f, "CLIENT-SUBNET"),
            EdnsOptionCode::Cookie => write!(f, "COOKIE"),
            EdnsOptionCode::TcpKeepalive => write!(f, "TCP-KEEPALIVE"),
            EdnsOptionCode::Padding => write!(f, "PADDING"),
            EdnsOptionCode::ExtendedError => write!(f, "EDE"),
            EdnsOptionCode::Unknown(x) => write!(f, "OPT={}", x),
        }
    }
}

impl EdnsOpt {
    pub fn new() -> Self {
        Self {
            udp_payload_size: 4096,
            extended_rcode: 0,
            version: 0,
            flags: 0,
            options: Vec::new(),
        }
    }

    pub fn with_payload_size(payload_size: u16) -> Self {
        Self {
            udp_payload_size: payload_size,
            ..Self::new()
        }
    }

    /// Check if DNSSEC OK (DO) flag is set
    pub fn do_flag(&self) -> bool {
        (self.flags & DO_BIT) != 0
    }

    /// Set the DNSSEC OK (DO) flag
    pub fn set_do_flag(&mut self, value: bool) {
        if value {
            self.flags |= DO_BIT;
        } else {
            self.flags &= !DO_BIT;
        }
    }

    /// Parse EDNS OPT record from DNS resource record data
    /// The OPT record uses the following format:
    /// - NAME: Root domain (empty)
    /// - TYPE: OPT (41)
    /// - CLASS: UDP payload size (16 bits)
    /// - TTL: Extended RCODE (8 bits) | Version (8 bits) | Flags (16 bits)
    /// - RDLENGTH: Length of option data
    /// - RDATA: Option data
    pub fn parse_from_resource(class: u16, ttl: u32, rdata: &[u8]) -> Result<Self, ParseError> {
        let extended_rcode = ((ttl >> 24) & 0xFF) as u8;
        let version = ((ttl >> 16) & 0xFF) as u8;
        let flags = (ttl & 0xFFFF) as u16;

        let mut options = Vec::new();
        let mut pos = 0;

        while pos + 4 <= rdata.len() {
            let code = u16::from_be_bytes([rdata[pos], rdata[pos + 1]]);
            let length = u16::from_be_bytes([rdata[pos + 2], rdata[pos + 3]]) as usize;
            pos += 4;

            let data = rdata
                .get(pos..pos + length)
                .ok_or_else(|| ParseError::InvalidRdata(format!("EDNS option {} overruns", code)))?
                .to_vec();
            pos += length;

            options.push(EdnsOption { code, data });
        }

        Ok(EdnsOpt {
            udp_payload_size: class,
            extended_rcode,
            version,
            flags,
            options,
        })
    }

    /// The OPT pseudo-record as it appears in the additional section
    pub fn to_resource(&self) -> DNSResource {
        let ttl = ((self.extended_rcode as u32) << 24)
            | ((self.version as u32) << 16)
            | (self.flags as u32);

        let mut rdata = Vec::new();
        for option in &self.options {
            rdata.extend_from_slice(&option.code.to_be_bytes());
            rdata.extend_from_slice(&(option.data.len() as u16).to_be_bytes());
            rdata.extend_from_slice(&option.data);
        }

        DNSResource {
            labels: Vec::new(),
            rtype: DNSResourceType::OPT,
            rclass: self.udp_payload_size.into(),
            raw_class: self.udp_payload_size,
            ttl,
            rdlength: rdata.len() as u16,
            rdata,
            parsed_rdata: None,
        }
    }

    /// Flag mnemonics as dig prints them (`do`, or empty)
    pub fn flags_description(&self) -> String {
        let mut flags = Vec::new();

        if self.do_flag() {
            flags.push("do");
        }

        flags.join(" ")
    }

    pub fn debug_info(&self) -> String {
        format!(
            "EDNS0: payload_size={}, version={}, flags=0x{:04x} ({}), options={}",
            self.udp_payload_size,
            self.version,
            self.flags,
            self.flags_description(),
            self.options.len()
        )
    }
}

impl std::fmt::Display for EdnsOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.debug_info())
    }
}
