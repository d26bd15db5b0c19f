use clap::{Parser, Subcommand};
use ringkv::client::{db_client::DbClient, Client};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "ringkv-client")]
#[command(about = "ringkv-client tcp client", long_about = None)]
struct Cli {
    /// Address of the server (router or storage node)
    #[arg(long, default_value = "127.0.0.1:4000")]
    addr: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Checks that the server is alive
    Ping,
    /// Reads a key from a storage node
    Get {
        #[arg(short, long)]
        key: String,
    },
    /// Writes a key to a storage node
    Set {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        value: String,
    },
    /// Adds the storage node at `endpoint` to the router's ring
    AddNode {
        #[arg(short, long)]
        endpoint: String,
    },
    /// Removes a node from the router's ring
    DeleteNode {
        #[arg(short, long)]
        node_id: String,
    },
    NodeCount,
    /// Lists the ids of the nodes holding `key`
    ResolveReplicas {
        #[arg(short, long)]
        key: String,
    },
    /// Stores a value in every replica of `key`
    StoreValue {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        value: String,
    },
    /// Reads `key` from all of its replicas
    GetValue {
        #[arg(short, long)]
        key: String,
    },
    ListNodes,
}

fn print<T: Serialize>(response: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut client = DbClient::new(args.addr);
    client.connect().await?;

    match args.command {
        Commands::Ping => print(client.ping().await?),
        Commands::Get { key } => print(client.get(key).await?),
        Commands::Set { key, value } => print(client.set(key, value).await?),
        Commands::AddNode { endpoint } => print(client.add_node(endpoint).await?),
        Commands::DeleteNode { node_id } => print(client.delete_node(node_id).await?),
        Commands::NodeCount => print(client.node_count().await?),
        Commands::ResolveReplicas { key } => print(client.resolve_replicas(key).await?),
        Commands::StoreValue { key, value } => print(client.store_value(key, value).await?),
        Commands::GetValue { key } => print(client.get_value(key).await?),
        Commands::ListNodes => print(client.list_nodes().await?),
    }
}
