use anyhow::Context as _;
use clap::Parser as _;
use devtunnel_server::config::ServerArgs;
use devtunnel_server::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(&args.log_level, args.log_format)?;
    devtunnel_server::run(args).await.context("run devtunnel server")
}
