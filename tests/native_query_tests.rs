mod common;

use common::{
    answer_for, spawn_raw_udp_upstream, spawn_tcp_upstream, spawn_udp_upstream,
    truncated_answer_for,
};
use dnssec_checker::{
    classifier::{Verdict, classify},
    domain::normalize_domain,
    query::{DnssecQuery, NativeQuery, QueryTermination},
};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::Ordering;
use std::time::Duration;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

#[tokio::test]
async fn test_signed_answer_is_valid() {
    let (addr, seen) = spawn_udp_upstream(|query| {
        assert!(
            query.edns.as_ref().is_some_and(|edns| edns.do_flag()),
            "query must carry the DO bit"
        );
        assert!(query.header.ad, "query must ask for AD");
        Some(answer_for(query, true))
    })
    .await;

    let domain = normalize_domain("example.com").unwrap();
    let raw = NativeQuery::new(addr.port(), 1232)
        .query(&domain, LOCALHOST, Duration::from_secs(5))
        .await;

    assert_eq!(raw.termination, QueryTermination::Completed, "{}", raw.text);
    assert!(raw.text.contains(";; flags: qr rd ra ad;"), "{}", raw.text);
    assert!(raw.text.contains("\tIN\tRRSIG\tA 13 2 300 "), "{}", raw.text);
    assert!(raw.text.contains(";; SERVER: 127.0.0.1#"), "{}", raw.text);
    assert_eq!(classify(raw, &domain).verdict, Verdict::Valid);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unvalidated_answer_is_invalid() {
    let (addr, _) = spawn_udp_upstream(|query| Some(answer_for(query, false))).await;

    let domain = normalize_domain("example.com").unwrap();
    let raw = NativeQuery::new(addr.port(), 1232)
        .query(&domain, LOCALHOST, Duration::from_secs(5))
        .await;

    assert_eq!(raw.termination, QueryTermination::Completed);
    assert!(!raw.text.contains("RRSIG"));
    assert_eq!(classify(raw, &domain).verdict, Verdict::Invalid);
}

#[tokio::test]
async fn test_mismatched_ids_are_ignored() {
    let (addr, _) = spawn_udp_upstream(|query| {
        let mut stray = answer_for(query, true);
        stray.header.id = query.header.id.wrapping_add(1);
        Some(stray)
    })
    .await;

    let domain = normalize_domain("example.com").unwrap();
    let raw = NativeQuery::new(addr.port(), 1232)
        .query(&domain, LOCALHOST, Duration::from_millis(300))
        .await;

    assert_eq!(raw.termination, QueryTermination::TimedOut);
}

#[tokio::test]
async fn test_garbage_datagrams_are_skipped() {
    let (addr, _) = spawn_raw_udp_upstream(|query| {
        vec![
            vec![0xff; 5],
            vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x3f],
            answer_for(query, true).serialize().unwrap(),
        ]
    })
    .await;

    let domain = normalize_domain("example.com").unwrap();
    let raw = NativeQuery::new(addr.port(), 1232)
        .query(&domain, LOCALHOST, Duration::from_secs(5))
        .await;

    assert_eq!(raw.termination, QueryTermination::Completed, "{}", raw.text);
    assert_eq!(classify(raw, &domain).verdict, Verdict::Valid);
}

#[tokio::test]
async fn test_only_garbage_times_out() {
    let (addr, _) = spawn_raw_udp_upstream(|_| vec![vec![0xff; 5]]).await;

    let domain = normalize_domain("example.com").unwrap();
    let raw = NativeQuery::new(addr.port(), 1232)
        .query(&domain, LOCALHOST, Duration::from_millis(300))
        .await;

    assert_eq!(raw.termination, QueryTermination::TimedOut);
}

#[tokio::test]
async fn test_silent_resolver_times_out() {
    let (addr, seen) = spawn_udp_upstream(|_| None).await;

    let domain = normalize_domain("example.com").unwrap();
    let started = std::time::Instant::now();
    let raw = NativeQuery::new(addr.port(), 1232)
        .query(&domain, LOCALHOST, Duration::from_millis(300))
        .await;

    assert_eq!(raw.termination, QueryTermination::TimedOut);
    assert_eq!(raw.text, "Timeout: DNSSEC check exceeded timeout limit");
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(classify(raw, &domain).verdict, Verdict::Timeout);
}

#[tokio::test]
async fn test_truncated_answer_retries_over_tcp() {
    let (addr, udp_seen) = spawn_udp_upstream(|query| Some(truncated_answer_for(query))).await;
    let tcp_seen = spawn_tcp_upstream(addr).await;

    let domain = normalize_domain("example.com").unwrap();
    let raw = NativeQuery::new(addr.port(), 1232)
        .query(&domain, LOCALHOST, Duration::from_secs(5))
        .await;

    assert_eq!(raw.termination, QueryTermination::Completed, "{}", raw.text);
    assert!(raw.text.contains("(TCP)"), "{}", raw.text);
    assert_eq!(udp_seen.load(Ordering::SeqCst), 1);
    assert_eq!(tcp_seen.load(Ordering::SeqCst), 1);
    assert_eq!(classify(raw, &domain).verdict, Verdict::Valid);
}

#[tokio::test]
async fn test_connection_refused_over_tcp_is_error() {
    // Truncated over UDP, nothing listening on TCP
    let (addr, _) = spawn_udp_upstream(|query| Some(truncated_answer_for(query))).await;

    let domain = normalize_domain("example.com").unwrap();
    let raw = NativeQuery::new(addr.port(), 1232)
        .query(&domain, LOCALHOST, Duration::from_secs(5))
        .await;

    assert_eq!(raw.termination, QueryTermination::Failed);
    assert!(raw.text.starts_with("IO error:"), "{}", raw.text);
    assert_eq!(classify(raw, &domain).verdict, Verdict::Error);
}
