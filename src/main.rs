use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;

use agent_mesh::mcp::{HandlerRegistry, McpBridge};
use agent_mesh::server::{serve, AppState};
use agent_mesh::store::{ArtifactStore, FsArtifactStore, MemoryArtifactStore, MemoryEventBus, MemoryKvStore, Services};
use agent_mesh::workflow::tasks::register_all_tasks;
use agent_mesh::workflow::{RunTracker, TaskRegistry, WorkflowEngine, WorkflowLoader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP tool bridge and event relay
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8900)]
        port: u16,
    },
    /// Execute a workflow definition file once and print the result
    Run {
        /// Path to the workflow file (.yaml/.yml/.json)
        #[arg(short, long)]
        file: String,
    },
    /// Run advisory validation for every node in a workflow file
    Validate {
        /// Path to the workflow file (.yaml/.yml/.json)
        #[arg(short, long)]
        file: String,
    },
}

fn build_services() -> Services {
    // AGENT_MESH_ARTIFACTS_DIR switches artifacts onto the filesystem backend
    let artifacts: Arc<dyn ArtifactStore> = match std::env::var("AGENT_MESH_ARTIFACTS_DIR") {
        Ok(dir) => {
            log::info!("Using filesystem artifact store at {}", dir);
            Arc::new(FsArtifactStore::new(dir))
        }
        Err(_) => Arc::new(MemoryArtifactStore::new()),
    };

    Services {
        kv: Arc::new(MemoryKvStore::new()),
        artifacts,
        events: Arc::new(MemoryEventBus::new()),
    }
}

async fn build_engine(services: &Services) -> WorkflowEngine {
    let registry = TaskRegistry::new();
    register_all_tasks(&registry, services).await;
    WorkflowEngine::new(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Serve { port } => {
            let services = build_services();
            let engine = build_engine(&services).await;
            let handlers =
                HandlerRegistry::new(services.clone(), engine.clone(), RunTracker::new());

            let state = AppState {
                bridge: Arc::new(McpBridge::new(Arc::new(handlers))),
                services,
                engine,
            };

            serve(port, state).await?;
        }
        Commands::Run { file } => {
            let services = build_services();
            let engine = build_engine(&services).await;

            let definition = WorkflowLoader::new().load(&file)?;
            println!("Running workflow: {}", definition.name);

            let result = engine.execute(&definition).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Validate { file } => {
            let services = build_services();
            let engine = build_engine(&services).await;

            let definition = WorkflowLoader::new().load(&file)?;
            let mut problems = 0usize;

            for node in &definition.nodes {
                let task = match engine.registry().resolve(&node.node_type).await {
                    Ok(task) => task,
                    Err(err) => {
                        problems += 1;
                        println!("node '{}': {}", node.id, err);
                        continue;
                    }
                };

                let report = task.validate(&node.config);
                for error in &report.errors {
                    problems += 1;
                    println!("node '{}': error: {}", node.id, error);
                }
                for warning in &report.warnings {
                    println!("node '{}': warning: {}", node.id, warning);
                }
            }

            if problems == 0 {
                println!("Workflow '{}' is valid", definition.name);
            } else {
                anyhow::bail!("{} validation problem(s) found", problems);
            }
        }
    }

    Ok(())
}
