// Forget command - drop the resumable run pointer

use anyhow::Result;
use serde_json::json;

use crate::client::Client;
use crate::output::OutputFormat;

pub async fn run(
    client: &Client,
    output: OutputFormat,
    quiet: bool,
    conversation: String,
) -> Result<()> {
    let pointers = client.pointers();
    let previous = pointers.load(&conversation).await?;
    pointers.clear(&conversation).await?;

    if output.is_text() {
        if !quiet {
            match previous {
                Some(run_id) => println!("Forgot run {} for conversation {}", run_id, conversation),
                None => println!("No stored run for conversation {}", conversation),
            }
        }
    } else {
        output.print_value(&json!({
            "conversation_id": conversation,
            "forgotten_run_id": previous,
        }))?;
    }
    Ok(())
}
