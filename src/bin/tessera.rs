use anyhow::Result;
use tessera::cli::{actions, actions::Action, start};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments and initialize logging
    let action = start()?;

    // Handle the action
    match action {
        Action::Server(args) => actions::server::execute(*args).await?,
    }

    Ok(())
}
