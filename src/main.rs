use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "medscan",
    version,
    about = "Extract medicine details from barcode and GS1 label photos"
)]
struct Cli {
    /// Image containing a barcode (JPEG/PNG)
    image: Option<String>,

    /// Run the HTTP server instead (optional address, default from settings)
    #[arg(long = "server", num_args = 0..=1, default_missing_value = "")]
    server: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    medscan::logging::init(cli.verbose)?;

    let output = medscan::run(medscan::Config {
        image: cli.image,
        settings_path: cli.read_settings,
        server: cli.server,
    })
    .await?;

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
