//! Render a parsed response the way `dig` prints it, so native and dig
//! backends hand the classifier the same kind of text.

use std::fmt::Write;
use std::net::SocketAddr;
use std::time::Duration;

use super::{
    DNSPacket,
    constants::{DNSRcode, Opcode},
    edns::EdnsOptionCode,
    resource::DNSResource,
};

/// Transport facts about an exchange that dig also prints
#[derive(Debug, Clone)]
pub struct ExchangeInfo<'a> {
    pub domain: &'a str,
    pub server: SocketAddr,
    pub protocol: &'static str,
    pub elapsed: Duration,
    pub message_size: usize,
}

pub fn render(packet: &DNSPacket, info: &ExchangeInfo<'_>) -> String {
    let mut out = String::new();
    let header = &packet.header;

    let _ = writeln!(
        out,
        "; <<>> {} {} <<>> +dnssec {} @{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        info.domain,
        info.server.ip()
    );
    let _ = writeln!(out, ";; Got answer:");
    let _ = writeln!(
        out,
        ";; ->>HEADER<<- opcode: {:?}, status: {}, id: {}",
        Opcode::from(header.opcode),
        DNSRcode::name(header.rcode),
        header.id
    );
    let _ = writeln!(
        out,
        ";; flags: {}; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
        header.flag_names().join(" "),
        packet.questions.len(),
        packet.answers.len(),
        packet.authorities.len(),
        packet.additional_count()
    );

    if let Some(edns) = &packet.edns {
        let _ = writeln!(out);
        let _ = writeln!(out, ";; OPT PSEUDOSECTION:");
        let _ = writeln!(
            out,
            "; EDNS: version: {}, flags: {}; udp: {}",
            edns.version,
            edns.flags_description(),
            edns.udp_payload_size
        );
        for option in &edns.options {
            let _ = writeln!(
                out,
                "; {}: {}",
                EdnsOptionCode::from(option.code),
                hex::encode(&option.data)
            );
        }
    }

    let _ = writeln!(out, ";; QUESTION SECTION:");
    for question in &packet.questions {
        let _ = writeln!(
            out,
            ";{}\t\t\t{}\t{}",
            question.name(),
            question.qclass,
            question.qtype
        );
    }

    write_section(&mut out, "ANSWER", &packet.answers);
    write_section(&mut out, "AUTHORITY", &packet.authorities);
    write_section(&mut out, "ADDITIONAL", &packet.resources);

    let _ = writeln!(out);
    let _ = writeln!(out, ";; Query time: {} msec", info.elapsed.as_millis());
    let _ = writeln!(
        out,
        ";; SERVER: {}#{}({}) ({})",
        info.server.ip(),
        info.server.port(),
        info.server.ip(),
        info.protocol
    );
    let _ = writeln!(out, ";; WHEN: {}", chrono::Utc::now().to_rfc2822());
    let _ = writeln!(out, ";; MSG SIZE  rcvd: {}", info.message_size);

    out
}

fn write_section(out: &mut String, title: &str, records: &[DNSResource]) {
    if records.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, ";; {} SECTION:", title);
    for record in records {
        let _ = writeln!(out, "{}", record_line(record));
    }
}

/// One record in zone-file form: owner, TTL, class, type, RDATA
pub fn record_line(record: &DNSResource) -> String {
    format!(
        "{}\t\t{}\t{}\t{}\t{}",
        record.name(),
        record.ttl,
        record.rclass,
        record.rtype,
        record.rdata_text()
    )
}
