use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;

use fittingflow_rs::engine::Context;
use fittingflow_rs::flow::{server, Builder, ServerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind (overrides FITTINGFLOW_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides FITTINGFLOW_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of static files to serve (overrides FITTINGFLOW_STATIC_DIR)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Run a workflow from a definition file
    Run {
        /// Path to the workflow file
        #[arg(short, long)]
        file: PathBuf,

        /// Initial context as a JSON object
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Check a workflow definition and print its execution order
    Validate {
        /// Path to the workflow file
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Serve {
            host,
            port,
            static_dir,
        } => {
            let mut config = ServerConfig::from_env()?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if static_dir.is_some() {
                config.static_dir = static_dir;
            }
            server::serve(config).await?;
        }
        Commands::Run { file, input } => {
            let workflow = Builder::new().build_from_file(&file).await?;
            let input = match input {
                Some(raw) => {
                    let value = serde_json::from_str(&raw).context("--input is not valid JSON")?;
                    Context::from_value(value).context("--input must be a JSON object")?
                }
                None => Context::new(),
            };

            log::info!("Running workflow: {}", workflow.name());
            match workflow.run(input).await {
                Ok(execution) => println!("{}", serde_json::to_string_pretty(&execution)?),
                Err(failure) => {
                    println!("{}", serde_json::to_string_pretty(&failure.execution)?);
                    return Err(failure.into());
                }
            }
        }
        Commands::Validate { file } => {
            let workflow = Builder::new().build_from_file(&file).await?;
            let order = workflow.execution_order().await?;
            println!("{}: {}", workflow.name(), order.join(" -> "));
        }
    }

    Ok(())
}
