use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tracing::{debug, trace};

use super::{DnssecQuery, RawQueryResult, bounded};
use crate::dns::DNSPacket;
use crate::dns::presentation::{self, ExchangeInfo};
use crate::domain::NormalizedDomain;
use crate::error::QueryError;

/// Largest UDP datagram we are prepared to receive
const MAX_UDP_RESPONSE: usize = 4096;

/// Queries the resolver directly with the crate's own wire codec, over UDP
/// with a TCP retry for truncated answers.
#[derive(Debug, Clone)]
pub struct NativeQuery {
    port: u16,
    edns_buffer_size: u16,
}

impl NativeQuery {
    pub fn new(port: u16, edns_buffer_size: u16) -> Self {
        Self {
            port,
            edns_buffer_size,
        }
    }

    async fn exchange(&self, domain: &NormalizedDomain, resolver: IpAddr) -> Result<String, QueryError> {
        let server = SocketAddr::new(resolver, self.port);
        let query = DNSPacket::dnssec_query(rand::random(), domain.as_str(), self.edns_buffer_size);
        let query_bytes = query.serialize().map_err(QueryError::Encode)?;

        trace!("Sending {} bytes to {}", query_bytes.len(), server);
        let started = Instant::now();

        let (mut response, mut size) = self.send_udp_query(&query_bytes, query.header.id, server).await?;
        let mut protocol = "UDP";
        if response.header.tc {
            debug!("UDP response from {} truncated, retrying with TCP", server);
            (response, size) = self.send_tcp_query(&query_bytes, query.header.id, server).await?;
            protocol = "TCP";
        }

        let info = ExchangeInfo {
            domain: domain.as_str(),
            server,
            protocol,
            elapsed: started.elapsed(),
            message_size: size,
        };
        Ok(presentation::render(&response, &info))
    }

    async fn send_udp_query(
        &self,
        query_bytes: &[u8],
        id: u16,
        server: SocketAddr,
    ) -> Result<(DNSPacket, usize), QueryError> {
        let local: SocketAddr = match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;
        socket.send(query_bytes).await?;

        let mut response_buf = vec![0u8; MAX_UDP_RESPONSE];
        // Datagrams that are malformed or do not answer our query are dropped;
        // the deadline around the exchange bounds how long we keep listening
        loop {
            let response_len = socket.recv(&mut response_buf).await?;
            trace!(
                "Raw UDP response data ({} bytes): {:02x?}",
                response_len,
                &response_buf[..response_len.min(64)]
            );

            match DNSPacket::parse(&response_buf[..response_len]) {
                Ok(response) if is_answer_to(&response, id) => {
                    log_response_details(&response, response_len, "UDP");
                    return Ok((response, response_len));
                }
                Ok(response) => {
                    debug!(
                        "Ignoring UDP datagram from {} with id {} (expected {})",
                        server, response.header.id, id
                    );
                }
                Err(e) => {
                    debug!(
                        "Ignoring unparseable {} byte UDP datagram from {}: {}",
                        response_len, server, e
                    );
                }
            }
        }
    }

    async fn send_tcp_query(
        &self,
        query_bytes: &[u8],
        id: u16,
        server: SocketAddr,
    ) -> Result<(DNSPacket, usize), QueryError> {
        let mut stream = TcpStream::connect(server).await?;

        stream
            .write_all(&(query_bytes.len() as u16).to_be_bytes())
            .await?;
        stream.write_all(query_bytes).await?;
        stream.flush().await?;

        let mut length_buf = [0u8; 2];
        stream.read_exact(&mut length_buf).await?;
        let response_length = u16::from_be_bytes(length_buf) as usize;

        let mut response_buf = vec![0; response_length];
        stream.read_exact(&mut response_buf).await?;

        let response = DNSPacket::parse(&response_buf).map_err(QueryError::Parse)?;
        if !is_answer_to(&response, id) {
            return Err(QueryError::UnexpectedResponse(server.to_string()));
        }

        log_response_details(&response, response_length, "TCP");
        Ok((response, response_length))
    }
}

fn is_answer_to(response: &DNSPacket, id: u16) -> bool {
    response.header.qr && response.header.id == id
}

fn log_response_details(response: &DNSPacket, response_len: usize, protocol: &str) {
    debug!(
        "Parsed {} response ({} bytes): rcode={}, ad={}, answers={}, authorities={}, additional={}",
        protocol,
        response_len,
        response.header.rcode,
        response.header.ad,
        response.answers.len(),
        response.authorities.len(),
        response.additional_count()
    );
}

#[async_trait]
impl DnssecQuery for NativeQuery {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn query(
        &self,
        domain: &NormalizedDomain,
        resolver: IpAddr,
        limit: Duration,
    ) -> RawQueryResult {
        bounded(limit, self.exchange(domain, resolver)).await
    }
}
