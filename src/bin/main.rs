use anyhow::Result;
use clap::Parser;
use roc_stage::{config::StageArgs, pipeline::Pipeline};
use tracing::{info, Level};

/// Stage a nightly roc toolchain and build basic-cli against it
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(long, global = true, default_value_t = Level::INFO)]
    level: tracing::Level,

    #[command(flatten)]
    stage: StageArgs,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let mut subscriber = tracing_subscriber::FmtSubscriber::builder().with_max_level(cli.level);

    // when we run the command with `TRACE` or `DEBUG` level, we want to see
    // the file and line number...
    if [Level::DEBUG, Level::TRACE].contains(&cli.level) {
        subscriber = subscriber.with_file(true).with_line_number(true);
    }
    let subscriber = subscriber.finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.stage.into_config()?;

    let staged = Pipeline::new(config).run().await?;

    info!(
        "done: {} at {}, toolchain {}",
        staged.checkout.tag,
        staged.checkout.commit,
        staged.toolchain.path.display()
    );

    Ok(())
}
