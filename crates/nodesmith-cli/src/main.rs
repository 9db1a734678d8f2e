use anyhow::Result;
use clap::Parser;
use cliclack::{input, spinner};
use console::style;
use dotenv::dotenv;

use nodesmith::agent::{Agent, TurnOutcome};
use nodesmith::catalog::material_tools;
use nodesmith::logger::TurnLog;
use nodesmith::mcp::EngineClient;
use nodesmith::providers::factory::get_provider;
use nodesmith::retrieval::{ChromaBackend, Retriever};

mod config;

use config::Settings;

#[derive(Parser)]
#[command(author, version, about = "Procedural material synthesis for Blender", long_about = None)]
struct Cli {
    /// Provider to use (gemini or openai); overrides LLM_PROVIDER
    #[arg(short, long)]
    provider: Option<String>,

    /// Model to use; overrides the provider's model environment variable
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenv().ok();

    let settings = Settings::from_env(cli.provider.as_deref(), cli.model.as_deref())?;

    let tools = material_tools();
    let provider = get_provider(settings.provider.clone(), &tools)?;

    let spin = spinner();
    spin.start("Starting Blender engine");
    let (command, args) = settings.engine_command();
    let engine = match EngineClient::connect(&command, &args).await {
        Ok(engine) => engine,
        Err(e) => {
            spin.stop("Blender engine failed to start");
            return Err(e.into());
        }
    };
    spin.stop("Blender engine ready");

    let backend = ChromaBackend::new(&settings.chroma_url, &settings.chroma_collection)?;
    let retriever = Retriever::new(Box::new(backend));

    let mut agent = Agent::new(provider, Box::new(engine), retriever);

    println!(
        "Nodesmith ({}) {}",
        settings.model_name(),
        style("- type \"quit\" to end the session").dim()
    );
    println!();

    loop {
        let request: String = input("Describe a material:").placeholder("").interact()?;
        let request = request.trim();

        if request.is_empty() {
            continue;
        }
        if request.eq_ignore_ascii_case("quit") || request.eq_ignore_ascii_case("exit") {
            break;
        }

        let mut log = TurnLog::new().with_echo();
        let outcome = agent.run_turn(request, &mut log).await;

        match log.save(&settings.output_dir) {
            Ok(path) => println!("[Logger] Log saved to {}", path.display()),
            Err(e) => eprintln!("[Logger] Failed to save log: {}", e),
        }

        match outcome {
            Ok(TurnOutcome::Completed) => {}
            Ok(TurnOutcome::Aborted) => {
                println!("{}", style("Turn aborted; see log for details").yellow());
            }
            Ok(TurnOutcome::LoopLimitReached) => {
                println!("{}", style("Tool loop limit reached").yellow());
            }
            Err(e) => {
                eprintln!("{}", style(format!("Engine connection lost: {}", e)).red());
                break;
            }
        }

        println!();
    }

    agent.shutdown().await;
    Ok(())
}
