// Chat command - submit a message and follow the run

use anyhow::Result;
use parley_core::{ConversationScope, RunStatus};
use uuid::Uuid;

use super::follow::follow;
use crate::client::Client;
use crate::output::{print_field, OutputFormat, TimelinePrinter};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    client: &Client,
    output: OutputFormat,
    quiet: bool,
    message: String,
    project: String,
    conversation: Option<String>,
    timeout_secs: u64,
    no_wait: bool,
) -> Result<()> {
    let conversation = conversation.unwrap_or_else(|| Uuid::now_v7().to_string());
    if !quiet {
        // Keep stdout parseable in json/yaml mode
        if output.is_text() {
            print_field("Conversation", &conversation);
        } else {
            eprintln!("Conversation: {}", conversation);
        }
    }

    let controller = client
        .open(ConversationScope::new(project, conversation))
        .await?;

    // History of a resumed conversation is not echoed again
    let mut printer = TimelinePrinter::new();
    printer.new_lines(&controller.view());

    controller.submit(&message).await?;

    if no_wait {
        let view = controller.view();
        if output.is_text() {
            if let Some(run_id) = &view.run_id {
                print_field("Run", run_id);
            }
            print_field("Status", &view.status_label());
        } else {
            output.print_value(&view)?;
        }
        return Ok(());
    }

    if output.is_text() && !quiet {
        println!();
    }
    let view = follow(&controller, &mut printer, output.is_text(), timeout_secs).await?;
    controller.close();

    if !output.is_text() {
        output.print_value(&view)?;
    }

    match view.status {
        Some(RunStatus::Failed) => anyhow::bail!("Run failed"),
        Some(RunStatus::Timeout) => anyhow::bail!("Run timed out"),
        _ => Ok(()),
    }
}
