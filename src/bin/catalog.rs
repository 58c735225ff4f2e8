use anyhow::Result;
use clap::{Parser, Subcommand};
use item_catalog_server::{
    client::{Item, ItemsClient},
    Document,
};
use serde_json::{json, Value};
use url::Url;

#[derive(Parser, Debug)]
#[command(about = "Command line front end for the item catalog server")]
struct Cli {
    /// Base URL of the catalog server
    #[clap(short, long, default_value = "http://localhost:3000")]
    server: Url,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List items, with optional client-side price filtering
    List {
        /// Keep only items priced at least this much
        #[clap(long)]
        min: Option<f64>,
        /// Keep only items priced at most this much
        #[clap(long)]
        max: Option<f64>,
    },
    /// Add a new item
    Add { name: String, price: f64 },
    /// Update the name and/or price of an existing item
    Update {
        id: String,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        price: Option<f64>,
    },
    /// Delete an item by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Cli::parse();
    let client = ItemsClient::new(args.server)?;

    match args.command {
        Command::List { min, max } => {
            // price bounds are applied locally to the already-fetched list
            let items: Vec<Item> = client
                .list(&[])
                .await?
                .into_iter()
                .filter(|item| min.is_none_or(|min| item.price >= min))
                .filter(|item| max.is_none_or(|max| item.price <= max))
                .collect();
            print_table(&items);
        }
        Command::Add { name, price } => {
            let item = client.create(&name, price).await?;
            println!("added {} ({})", item.name, item.id);
        }
        Command::Update { id, name, price } => {
            let mut fields = Document::new();
            if let Some(name) = name {
                fields.insert("name".to_string(), Value::String(name));
            }
            if let Some(price) = price {
                fields.insert("price".to_string(), json!(price));
            }
            if fields.is_empty() {
                anyhow::bail!("nothing to update: pass --name and/or --price");
            }
            let updated = client.update(&id, &fields).await?;
            println!("updated {} item(s)", updated.len());
        }
        Command::Delete { id } => {
            client.delete(&id).await?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn print_table(items: &[Item]) {
    println!("{:<36}  {:<20}  {:>10}", "id", "name", "price");
    for item in items {
        println!("{:<36}  {:<20}  {:>10.2}", item.id, item.name, item.price);
    }
}
