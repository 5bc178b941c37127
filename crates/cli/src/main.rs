use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use stubdns_domain::{CliOverrides, DomainError, RecordType};
use stubdns_infrastructure::dns::api::{addresses_json, error_json, records_json};
use stubdns_infrastructure::dns::resolver::{Family, Resolver, ResolverBuilder, ResultOrder};
use tracing::{debug, info};

mod bootstrap;

#[derive(Parser)]
#[command(name = "stubdns")]
#[command(version)]
#[command(about = "stubdns - embeddable stub DNS resolver")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Upstream server (repeatable), e.g. 1.1.1.1, 9.9.9.9:53, tls://1.1.1.1#cloudflare-dns.com
    #[arg(short = 's', long = "server", value_name = "SERVER")]
    servers: Vec<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    timeout: Option<u64>,

    /// Passes over the server list
    #[arg(long)]
    tries: Option<u32>,

    /// Disable the answer cache
    #[arg(long)]
    no_cache: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// IPv4 addresses of HOST
    Resolve { host: String },
    /// Addresses of HOST for an HTTP client
    Lookup {
        host: String,
        /// 0 (any), 4 or 6
        #[arg(long, default_value_t = 0)]
        family: u8,
        #[arg(long, value_enum, default_value_t = Order::Verbatim)]
        order: Order,
    },
    /// Records of one type
    Query {
        host: String,
        #[arg(short = 'r', long = "type", default_value = "A")]
        record_type: String,
    },
    /// PTR names of an IP address
    Reverse { ip: IpAddr },
    /// Configured upstream servers
    Servers,
}

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    Verbatim,
    Ipv4first,
    Ipv6first,
}

impl From<Order> for ResultOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Verbatim => ResultOrder::Verbatim,
            Order::Ipv4first => ResultOrder::Ipv4First,
            Order::Ipv6first => ResultOrder::Ipv6First,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        servers: (!cli.servers.is_empty()).then(|| cli.servers.clone()),
        timeout_ms: cli.timeout,
        tries: cli.tries,
        no_cache: cli.no_cache,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    debug!("stubdns v{}", env!("CARGO_PKG_VERSION"));

    let resolver = ResolverBuilder::from_config(&config).build()?;
    info!(servers = config.resolver.servers.len(), "Resolver ready");

    match run(&resolver, cli.command).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", error_json(&e));
            std::process::exit(1);
        }
    }
}

async fn run(resolver: &Resolver, command: Command) -> Result<String, DomainError> {
    match command {
        Command::Resolve { host } => Ok(addresses_json(&resolver.resolve(&host).await?)),
        Command::Lookup {
            host,
            family,
            order,
        } => {
            let family = Family::from_number(family).ok_or_else(|| {
                DomainError::InvalidInput(format!("family must be 0, 4 or 6, got {}", family))
            })?;
            let addresses = resolver.lookup(&host, family, order.into()).await?;
            Ok(addresses_json(&addresses))
        }
        Command::Query { host, record_type } => {
            let record_type: RecordType =
                record_type.parse().map_err(DomainError::InvalidInput)?;
            let answer = resolver.query(&host, record_type).await?;
            Ok(records_json(record_type, &answer.records))
        }
        Command::Reverse { ip } => {
            let names = resolver.reverse(ip).await?;
            Ok(serde_json::Value::from(names).to_string())
        }
        Command::Servers => {
            let servers: Vec<String> = resolver.servers().iter().map(|s| s.to_string()).collect();
            Ok(serde_json::Value::from(servers).to_string())
        }
    }
}
