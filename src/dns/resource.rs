use bitstream_io::{BitRead, BitReader, BitWrite, BitWriter, Endianness};
use tracing::trace;

use super::{
    ParseError,
    common::{PacketComponent, domain_to_labels, labels_to_fqdn},
    enums::{DNSResourceClass, DNSResourceType},
    rdata,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSResource {
    pub labels: Vec<String>,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    /// Class field as read from the wire; the OPT record stores its UDP
    /// payload size here
    pub raw_class: u16,
    pub ttl: u32,
    pub rdlength: u16,
    pub rdata: Vec<u8>,
    /// RDATA in presentation format, with compressed names expanded
    pub parsed_rdata: Option<String>,
}

impl DNSResource {
    /// Build an IN-class record from raw RDATA
    pub fn new(name: &str, rtype: DNSResourceType, ttl: u32, rdata: Vec<u8>) -> Self {
        Self {
            labels: domain_to_labels(name),
            rtype,
            rclass: DNSResourceClass::IN,
            raw_class: DNSResourceClass::IN.into(),
            ttl,
            rdlength: rdata.len() as u16,
            rdata,
            parsed_rdata: None,
        }
    }

    pub fn name(&self) -> String {
        labels_to_fqdn(&self.labels)
    }

    pub fn read_with_buffer<E: Endianness>(
        &mut self,
        reader: &mut BitReader<&[u8], E>,
        packet_buf: &[u8],
    ) -> Result<(), ParseError> {
        self.labels = self.read_labels_with_buffer(reader, packet_buf)?;
        self.rtype = reader.read_var::<u16>(16)?.into();
        self.raw_class = reader.read_var::<u16>(16)?;
        self.rclass = self.raw_class.into();
        self.ttl = reader.read_var::<u32>(32)?;
        self.rdlength = reader.read_var::<u16>(16)?;
        let mut buf = vec![0_u8; self.rdlength as usize];
        reader.read_bytes(&mut buf)?;
        self.rdata = buf;

        if self.rtype != DNSResourceType::OPT {
            self.parsed_rdata = match rdata::to_presentation(self.rtype, &self.rdata, packet_buf) {
                Ok(text) => Some(text),
                Err(e) => {
                    trace!("Leaving {} RDATA in generic form: {}", self.rtype, e);
                    None
                }
            };
        }

        Ok(())
    }

    /// RDATA text for display, falling back to the RFC 3597 generic form
    pub fn rdata_text(&self) -> String {
        match &self.parsed_rdata {
            Some(text) => text.clone(),
            None => rdata::generic(&self.rdata),
        }
    }
}

impl PacketComponent for DNSResource {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError> {
        self.write_labels(writer, &self.labels)?;
        writer.write_var::<u16>(16, self.rtype.into())?;
        writer.write_var::<u16>(16, self.raw_class)?;
        writer.write_var::<u32>(32, self.ttl)?;
        writer.write_var::<u16>(16, self.rdata.len() as u16)?;
        writer.write_bytes(&self.rdata)?;
        Ok(())
    }

    fn read<E: Endianness>(&mut self, reader: &mut BitReader<&[u8], E>) -> Result<(), ParseError> {
        self.read_with_buffer(reader, &[])
    }
}
