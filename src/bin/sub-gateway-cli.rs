use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use sub_gateway::pipeline::flags::{compose_query, Toggle, Toggles};

#[derive(Parser)]
#[command(name = "sub-gateway-cli")]
#[command(about = "Client helper for the subscription gateway", long_about = None)]
struct Cli {
    /// Gateway base URL.
    #[arg(short, long, default_value = "http://localhost:3000", env = "SUB_GATEWAY_URL")]
    gateway: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Health,
    /// Print a configuration link
    Link(LinkArgs),
    /// Download a configuration through the gateway
    Fetch(LinkArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Singbox,
    Mihomo,
    V2ray,
}

#[derive(Args)]
struct LinkArgs {
    /// Subscription link; repeat for several
    #[arg(short, long = "url", required = true)]
    urls: Vec<String>,

    #[arg(short, long, value_enum, default_value = "singbox")]
    format: Format,

    /// Template URL or name (e.g. 1.12, default)
    #[arg(short, long)]
    template: Option<String>,

    #[arg(long)]
    udp: bool,
    #[arg(long)]
    udp_frag: bool,
    #[arg(long)]
    tls_frag: bool,
    /// Keep exclude_package in the TUN inbound
    #[arg(long)]
    ep: bool,
    /// Keep route_exclude_address in the TUN inbound
    #[arg(long)]
    ea: bool,
    #[arg(long)]
    tailscale: bool,
    #[arg(long)]
    tun: bool,
    #[arg(long)]
    adgdns: bool,
}

impl LinkArgs {
    fn toggles(&self) -> Toggles {
        let mut toggles = Toggles::default();
        let format = match self.format {
            Format::Singbox => Toggle::Singbox,
            Format::Mihomo => Toggle::Mihomo,
            Format::V2ray => Toggle::V2ray,
        };
        toggles.set(format, true);
        for (toggle, on) in [
            (Toggle::Udp, self.udp),
            (Toggle::UdpFragment, self.udp_frag),
            (Toggle::TlsFragment, self.tls_frag),
            (Toggle::ExcludePackage, self.ep),
            (Toggle::ExcludeAddress, self.ea),
            (Toggle::Tailscale, self.tailscale),
            (Toggle::Tun, self.tun),
            (Toggle::AdgDns, self.adgdns),
        ] {
            toggles.set(toggle, on);
        }
        toggles
    }

    fn link(&self, gateway: &str) -> String {
        let query = compose_query(&self.urls, self.template.as_deref(), &self.toggles());
        format!("{}/?{}", gateway.trim_end_matches('/'), query)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client
                .get(format!("{}/health", cli.gateway.trim_end_matches('/')))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Link(args) => {
            println!("{}", args.link(&cli.gateway));
        }
        Commands::Fetch(args) => {
            let res = client.get(args.link(&cli.gateway)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
