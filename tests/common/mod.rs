//! Shared helpers for the integration tests: answer builders, fake upstream
//! resolvers and a scripted query backend.

#![allow(dead_code)] // Each test binary uses a different subset

use async_trait::async_trait;
use dnssec_checker::{
    DnssecChecker,
    dns::{DNSPacket, enums::DNSResourceType, resource::DNSResource},
    domain::NormalizedDomain,
    model::CheckDefaults,
    query::{DnssecQuery, RawQueryResult},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;

/// dig-like text of a validated, signed answer for `domain`
pub fn signed_dig_output(domain: &str) -> String {
    format!(
        ";; ->>HEADER<<- opcode: QUERY, status: NOERROR, id: 4242\n\
         ;; flags: qr rd ra ad; QUERY: 1, ANSWER: 2, AUTHORITY: 0, ADDITIONAL: 1\n\
         \n\
         ;; ANSWER SECTION:\n\
         {domain}.\t\t300\tIN\tA\t192.0.2.1\n\
         {domain}.\t\t300\tIN\tRRSIG\tA 13 2 300 20250101000000 20241201000000 12345 {domain}. 3q2+7w==\n"
    )
}

/// RRSIG RDATA covering A records, signed by `signer`
pub fn rrsig_rdata(signer: &str) -> Vec<u8> {
    let mut rdata = Vec::new();
    rdata.extend(&u16::from(DNSResourceType::A).to_be_bytes());
    rdata.push(13);
    rdata.push(signer.trim_end_matches('.').split('.').count() as u8);
    rdata.extend(&300u32.to_be_bytes());
    rdata.extend(&1_735_689_600u32.to_be_bytes());
    rdata.extend(&1_733_011_200u32.to_be_bytes());
    rdata.extend(&12345u16.to_be_bytes());
    for label in signer.trim_end_matches('.').split('.') {
        rdata.push(label.len() as u8);
        rdata.extend(label.as_bytes());
    }
    rdata.push(0);
    rdata.extend(&[0xde, 0xad, 0xbe, 0xef]);
    rdata
}

/// Build an answer to `query`. With `signed`, the answer carries an RRSIG
/// and the AD flag is set.
pub fn answer_for(query: &DNSPacket, signed: bool) -> DNSPacket {
    let mut response = query.clone();
    response.header.qr = true;
    response.header.ra = true;
    response.header.ad = signed;

    let name = query
        .questions
        .first()
        .map(|q| q.name())
        .unwrap_or_else(|| ".".to_string());
    response
        .answers
        .push(DNSResource::new(&name, DNSResourceType::A, 300, vec![192, 0, 2, 1]));
    if signed {
        response.answers.push(DNSResource::new(
            &name,
            DNSResourceType::RRSIG,
            300,
            rrsig_rdata(&name),
        ));
    }
    response
}

/// Truncated, empty answer as a UDP-limited resolver would send it
pub fn truncated_answer_for(query: &DNSPacket) -> DNSPacket {
    let mut response = query.clone();
    response.header.qr = true;
    response.header.ra = true;
    response.header.tc = true;
    response
}

/// Fake upstream on 127.0.0.1: answers each UDP query with whatever
/// `respond` returns (nothing when it returns None)
pub async fn spawn_udp_upstream<F>(respond: F) -> (SocketAddr, Arc<AtomicUsize>)
where
    F: Fn(&DNSPacket) -> Option<DNSPacket> + Send + 'static,
{
    spawn_raw_udp_upstream(move |query| {
        respond(query)
            .map(|response| vec![response.serialize().unwrap()])
            .unwrap_or_default()
    })
    .await
}

/// Fake upstream sending each datagram `respond` returns, in order, as the
/// reply to a UDP query
pub async fn spawn_raw_udp_upstream<F>(respond: F) -> (SocketAddr, Arc<AtomicUsize>)
where
    F: Fn(&DNSPacket) -> Vec<Vec<u8>> + Send + 'static,
{
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let Ok(query) = DNSPacket::parse(&buf[..len]) else {
                continue;
            };
            for datagram in respond(&query) {
                let _ = socket.send_to(&datagram, peer).await;
            }
        }
    });

    (addr, seen)
}

/// Fake upstream listening on TCP at `addr`, answering every query with a
/// signed response
pub async fn spawn_tcp_upstream(addr: SocketAddr) -> Arc<AtomicUsize> {
    let listener = TcpListener::bind(addr).await.unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut len_buf = [0u8; 2];
                if stream.read_exact(&mut len_buf).await.is_err() {
                    return;
                }
                let mut buf = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                if stream.read_exact(&mut buf).await.is_err() {
                    return;
                }
                let query = DNSPacket::parse(&buf).unwrap();
                let bytes = answer_for(&query, true).serialize().unwrap();
                let _ = stream.write_all(&(bytes.len() as u16).to_be_bytes()).await;
                let _ = stream.write_all(&bytes).await;
            });
        }
    });

    seen
}

/// Backend returning a fixed result, or sleeping out the whole limit when
/// built with `hanging`
pub struct ScriptedQuery {
    result: Option<RawQueryResult>,
    pub calls: AtomicUsize,
}

impl ScriptedQuery {
    pub fn returning(result: RawQueryResult) -> Arc<Self> {
        Arc::new(Self {
            result: Some(result),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            result: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl DnssecQuery for ScriptedQuery {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn query(&self, _: &NormalizedDomain, _: IpAddr, limit: Duration) -> RawQueryResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Some(result) => result.clone(),
            None => {
                tokio::time::sleep(limit).await;
                RawQueryResult::timed_out()
            }
        }
    }
}

pub fn checker_with(backend: Arc<dyn DnssecQuery>) -> Arc<DnssecChecker> {
    Arc::new(DnssecChecker::new(
        backend,
        CheckDefaults::default(),
        CancellationToken::new(),
    ))
}
