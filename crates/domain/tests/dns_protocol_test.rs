use stubdns_domain::{parse_servers, DnsProtocol};

#[test]
fn test_parse_bare_ip_defaults_to_udp_53() {
    let protocol: DnsProtocol = "8.8.8.8".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Udp { .. }));
    assert_eq!(protocol.socket_addr().port(), 53);
}

#[test]
fn test_parse_udp() {
    let protocol: DnsProtocol = "udp://8.8.8.8:53".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Udp { .. }));
}

#[test]
fn test_parse_udp_custom_port() {
    let protocol: DnsProtocol = "127.0.0.1:5353".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Udp { .. }));
    assert_eq!(protocol.socket_addr().port(), 5353);
}

#[test]
fn test_parse_tcp() {
    let protocol: DnsProtocol = "tcp://8.8.8.8:53".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Tcp { .. }));
    assert_eq!(protocol.tcp_fallback(), None);
}

#[test]
fn test_parse_tls_default_port() {
    let protocol: DnsProtocol = "tls://1.1.1.1".parse().unwrap();
    if let DnsProtocol::Tls { addr, hostname } = protocol {
        assert_eq!(addr.port(), 853);
        assert_eq!(&*hostname, "1.1.1.1");
    } else {
        panic!("Expected Tls variant");
    }
}

#[test]
fn test_parse_tls_server_name() {
    let protocol: DnsProtocol = "tls://8.8.8.8:853#dns.google".parse().unwrap();
    assert_eq!(protocol.hostname(), Some("dns.google"));
    assert_eq!(protocol.to_string(), "tls://8.8.8.8:853#dns.google");
}

#[test]
fn test_parse_ipv6() {
    let bare: DnsProtocol = "2001:4860:4860::8888".parse().unwrap();
    assert_eq!(bare.socket_addr().port(), 53);

    let bracketed: DnsProtocol = "[2001:4860:4860::8888]:5353".parse().unwrap();
    assert_eq!(bracketed.socket_addr().port(), 5353);

    let tls: DnsProtocol = "tls://[2606:4700:4700::1111]".parse().unwrap();
    assert_eq!(tls.socket_addr().port(), 853);
}

#[test]
fn test_hostnames_are_rejected() {
    assert!("dns.google".parse::<DnsProtocol>().is_err());
    assert!("tls://dns.google:853".parse::<DnsProtocol>().is_err());
    assert!("https://1.1.1.1/dns-query".parse::<DnsProtocol>().is_err());
    assert!("tls://1.1.1.1#".parse::<DnsProtocol>().is_err());
    assert!("".parse::<DnsProtocol>().is_err());
}

#[test]
fn test_display_round_trips() {
    for s in [
        "8.8.8.8",
        "8.8.8.8:5353",
        "tcp://8.8.8.8:53",
        "tls://1.1.1.1:853",
        "tls://8.8.8.8:853#dns.google",
    ] {
        let protocol: DnsProtocol = s.parse().unwrap();
        assert_eq!(protocol.to_string(), s);
        assert_eq!(protocol.to_string().parse::<DnsProtocol>().unwrap(), protocol);
    }
}

#[test]
fn test_udp_has_tcp_fallback() {
    let protocol: DnsProtocol = "9.9.9.9".parse().unwrap();
    let fallback = protocol.tcp_fallback().unwrap();
    assert!(matches!(fallback, DnsProtocol::Tcp { .. }));
    assert_eq!(fallback.socket_addr(), protocol.socket_addr());
}

#[test]
fn test_parse_servers_keeps_order_and_fails_fast() {
    let servers = parse_servers(&["1.1.1.1", "tcp://8.8.8.8"]).unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0].socket_addr().ip().to_string(), "1.1.1.1");
    assert_eq!(servers[1].protocol_name(), "TCP");

    assert!(parse_servers(&["1.1.1.1", "not-an-ip"]).is_err());
}
