use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    carwatch_app::init_tracing();
    carwatch_app::run(carwatch_app::Cli::parse()).await
}
