// Resume command - reattach to the stored run of a conversation

use anyhow::Result;
use parley_core::ConversationScope;

use super::follow::follow;
use crate::client::Client;
use crate::output::{OutputFormat, TimelinePrinter};

pub async fn run(
    client: &Client,
    output: OutputFormat,
    quiet: bool,
    project: String,
    conversation: String,
    timeout_secs: u64,
) -> Result<()> {
    let controller = client
        .open(ConversationScope::new(project, conversation.clone()))
        .await?;

    let view = controller.view();
    if view.is_idle() {
        if output.is_text() {
            if !quiet {
                println!("No run to resume for conversation {}", conversation);
            }
        } else {
            output.print_value(&view)?;
        }
        return Ok(());
    }

    let mut printer = TimelinePrinter::new();
    let view = follow(&controller, &mut printer, output.is_text(), timeout_secs).await?;
    controller.close();

    if output.is_text() {
        if !quiet {
            println!("\nRun finished: {}", view.status_label());
        }
    } else {
        output.print_value(&view)?;
    }
    Ok(())
}
