use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// Logs go to stderr so the JSON record on stdout stays parseable.
pub fn init(verbose: bool) -> Result<()> {
    if !verbose {
        return Ok(());
    }
    let _ = fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .try_init();
    Ok(())
}
