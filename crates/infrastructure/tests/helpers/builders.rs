#![allow(dead_code)]
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stubdns_domain::{
    DnsProtocol, DomainError, RecordData, RecordType, ResourceRecord, SoaData, TransportError,
};
use stubdns_infrastructure::dns::upstream::UpstreamConnector;
use stubdns_infrastructure::dns::wire::{Message, Query, ResponseCode};

pub fn server(s: &str) -> DnsProtocol {
    s.parse().unwrap()
}

pub fn a(name: &str, ttl: u32, addr: [u8; 4]) -> ResourceRecord {
    ResourceRecord::new(name, RecordType::A, ttl, RecordData::A(Ipv4Addr::from(addr)))
}

pub fn aaaa(name: &str, ttl: u32, addr: Ipv6Addr) -> ResourceRecord {
    ResourceRecord::new(name, RecordType::AAAA, ttl, RecordData::Aaaa(addr))
}

pub fn soa(zone: &str, ttl: u32, minimum: u32) -> ResourceRecord {
    ResourceRecord::new(
        zone,
        RecordType::SOA,
        ttl,
        RecordData::Soa(SoaData {
            mname: format!("ns1.{}", zone),
            rname: format!("hostmaster.{}", zone),
            serial: 1,
            refresh: 7200,
            retry: 900,
            expire: 1_209_600,
            minimum,
        }),
    )
}

/// What a `ScriptedConnector` does for one exchange.
#[derive(Clone)]
pub enum Step {
    Answer(Vec<ResourceRecord>),
    /// NOERROR, no answers, these authority records.
    NoData(Vec<ResourceRecord>),
    Rcode(ResponseCode),
    Timeout,
    /// Never completes.
    Hang,
}

/// Connector that plays back `steps` in order, one per exchange, and
/// repeats the last step once the script runs out.
pub struct ScriptedConnector {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: AtomicUsize,
    servers: Mutex<Vec<DnsProtocol>>,
    questions: Mutex<Vec<(String, RecordType)>>,
}

impl ScriptedConnector {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            servers: Mutex::new(Vec::new()),
            questions: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(records: Vec<ResourceRecord>) -> Arc<Self> {
        Self::new(vec![Step::Answer(records)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Servers contacted, in order.
    pub fn servers_contacted(&self) -> Vec<DnsProtocol> {
        self.servers.lock().unwrap().clone()
    }

    /// Questions asked, in order.
    pub fn questions(&self) -> Vec<(String, RecordType)> {
        self.questions.lock().unwrap().clone()
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        match steps.pop_front() {
            Some(step) => {
                *last = Some(step.clone());
                step
            }
            None => last.clone().unwrap_or(Step::Timeout),
        }
    }
}

#[async_trait]
impl UpstreamConnector for ScriptedConnector {
    async fn exchange(
        &self,
        server: &DnsProtocol,
        query: &Query,
        _timeout: Duration,
    ) -> Result<Message, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.servers.lock().unwrap().push(server.clone());
        self.questions
            .lock()
            .unwrap()
            .push((query.name.to_string(), query.record_type));

        play(self.next_step(), server, query).await
    }
}

/// Connector that answers by record type; types without a step time out.
pub struct ByTypeConnector {
    steps: HashMap<RecordType, Step>,
    calls: AtomicUsize,
}

impl ByTypeConnector {
    pub fn new(steps: Vec<(RecordType, Step)>) -> Arc<Self> {
        Arc::new(Self {
            steps: steps.into_iter().collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamConnector for ByTypeConnector {
    async fn exchange(
        &self,
        server: &DnsProtocol,
        query: &Query,
        _timeout: Duration,
    ) -> Result<Message, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(&query.record_type)
            .cloned()
            .unwrap_or(Step::Timeout);
        play(step, server, query).await
    }
}

async fn play(step: Step, server: &DnsProtocol, query: &Query) -> Result<Message, DomainError> {
    let response = Message::response_to(query);
    match step {
        Step::Answer(records) => Ok(records
            .into_iter()
            .fold(response, |msg, rr| msg.with_answer(rr))),
        Step::NoData(authority) => Ok(authority
            .into_iter()
            .fold(response, |msg, rr| msg.with_authority(rr))),
        Step::Rcode(rcode) => Ok(response.with_rcode(rcode)),
        Step::Timeout => Err(TransportError::Timeout {
            server: server.to_string(),
        }
        .into()),
        Step::Hang => {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }
}
