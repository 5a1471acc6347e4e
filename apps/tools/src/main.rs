use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::{seed_catalog, BikeModel};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/registrations.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert the bundled catalog; existing serial numbers are left alone.
    SeedCatalog,
    AddBike {
        serial_number: String,
        model_description: String,
        shop_name: String,
    },
    ListBikes,
    ListRegistrations,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::SeedCatalog => {
            let inserted = storage.seed_catalog(&seed_catalog()).await?;
            println!("seeded {inserted} bikes");
        }
        Command::AddBike {
            serial_number,
            model_description,
            shop_name,
        } => {
            let bike = BikeModel::new(serial_number, model_description, shop_name);
            storage.upsert_bike(&bike).await?;
            println!("saved bike serial_number={}", bike.serial_number);
        }
        Command::ListBikes => {
            for bike in storage.list_bikes().await? {
                println!(
                    "{}\t{}\t{}",
                    bike.serial_number, bike.model_description, bike.shop_name
                );
            }
        }
        Command::ListRegistrations => {
            for registration in storage.list_registrations().await? {
                let payload = &registration.payload;
                println!(
                    "{}\t{}\t{} {}\t{}\t{}",
                    registration.id,
                    payload.serial_number,
                    payload.first_name,
                    payload.last_name,
                    payload.email,
                    registration.registered_at.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}
