use stockchat::{api, core::config::ChatConfig, init};
use std::net::SocketAddr;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "stockchat-server", about = "Stock chat HTTP API")]
struct Opt {
    /// Address to listen on; overrides STOCKCHAT_ADDR
    #[structopt(long)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let opt = Opt::from_args();
    let config = ChatConfig::from_env()?;
    log::debug!("Loaded {:?}", config);

    let service = init::build_service(&config)?;
    let app = api::router(service);

    let addr = opt.addr.unwrap_or(config.addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Starting server on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
