#![allow(dead_code)]
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stubdns_infrastructure::dns::wire::header::{FLAG_QR, FLAG_RA, FLAG_RD, FLAG_TC};
use stubdns_infrastructure::dns::wire::{self, Header, Message, ResponseCode};
use stubdns_domain::ResourceRecord;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// Given the decoded query, the raw replies to send back, in order.
pub type Responder = Arc<dyn Fn(&Message) -> Vec<Vec<u8>> + Send + Sync>;

/// Local UDP or TCP DNS stub bound to `127.0.0.1:0`.
pub struct MockDnsServer {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn udp(responder: Responder) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let queries = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let counter = queries.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        counter.fetch_add(1, Ordering::SeqCst);
                        let Ok(query) = wire::decode(&buf[..len]) else { continue };
                        for reply in responder(&query) {
                            let _ = socket.send_to(&reply, peer).await;
                        }
                    }
                }
            }
        });

        Self {
            addr,
            queries,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub async fn tcp(responder: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        Self::tcp_on(listener, addr, responder)
    }

    /// TCP stub on a fixed address, e.g. the port of a UDP stub.
    pub async fn tcp_at(addr: SocketAddr, responder: Responder) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        Self::tcp_on(listener, addr, responder)
    }

    fn tcp_on(listener: TcpListener, addr: SocketAddr, responder: Responder) -> Self {
        let queries = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let counter = queries.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        let Ok((mut stream, _)) = accepted else { continue };
                        let responder = responder.clone();
                        let counter = counter.clone();
                        tokio::spawn(async move {
                            let mut len = [0u8; 2];
                            if stream.read_exact(&mut len).await.is_err() {
                                return;
                            }
                            let mut buf = vec![0u8; u16::from_be_bytes(len) as usize];
                            if stream.read_exact(&mut buf).await.is_err() {
                                return;
                            }
                            counter.fetch_add(1, Ordering::SeqCst);
                            let Ok(query) = wire::decode(&buf) else { return };
                            for reply in responder(&query) {
                                let mut framed = (reply.len() as u16).to_be_bytes().to_vec();
                                framed.extend_from_slice(&reply);
                                let _ = stream.write_all(&framed).await;
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            queries,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queries received so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A response to `query` with the given rcode and answers.
pub fn reply(query: &Message, rcode: ResponseCode, answers: Vec<ResourceRecord>) -> Message {
    let mut header = Header {
        id: query.header.id,
        ..Default::default()
    };
    header.set_flag(FLAG_QR, true);
    header.set_flag(FLAG_RA, true);
    header.set_flag(FLAG_RD, query.header.recursion_desired());
    header.set_rcode(rcode);

    Message {
        header,
        questions: query.questions.clone(),
        answers,
        ..Default::default()
    }
}

pub fn encoded(message: &Message) -> Vec<u8> {
    wire::encode_message(message).unwrap()
}

/// Always answers with `answers`.
pub fn answering(answers: Vec<ResourceRecord>) -> Responder {
    Arc::new(move |query| vec![encoded(&reply(query, ResponseCode::NoError, answers.clone()))])
}

/// Always answers with an empty response carrying `rcode`.
pub fn failing_with(rcode: ResponseCode) -> Responder {
    Arc::new(move |query| vec![encoded(&reply(query, rcode, vec![]))])
}

/// Never answers.
pub fn silent() -> Responder {
    Arc::new(|_| vec![])
}

/// First a reply with the wrong transaction id, then the real one.
pub fn mismatched_then(answers: Vec<ResourceRecord>) -> Responder {
    Arc::new(move |query| {
        let mut wrong = reply(query, ResponseCode::NoError, vec![]);
        wrong.header.id = query.header.id.wrapping_add(1);
        vec![
            encoded(&wrong),
            encoded(&reply(query, ResponseCode::NoError, answers.clone())),
        ]
    })
}

/// An empty reply with the TC bit set.
pub fn truncated() -> Responder {
    Arc::new(|query| {
        let mut message = reply(query, ResponseCode::NoError, vec![]);
        message.header.set_flag(FLAG_TC, true);
        vec![encoded(&message)]
    })
}
