// Timeline command - print the current projection of a conversation

use anyhow::Result;
use parley_core::ConversationScope;

use crate::client::Client;
use crate::output::{print_field, OutputFormat, TimelinePrinter};

pub async fn run(
    client: &Client,
    output: OutputFormat,
    project: String,
    conversation: String,
) -> Result<()> {
    let controller = client
        .open(ConversationScope::new(project, conversation))
        .await?;
    let view = controller.view();
    controller.close();

    if !output.is_text() {
        return output.print_value(&view);
    }

    if let Some(run_id) = &view.run_id {
        print_field("Run", run_id);
    }
    print_field("Status", &view.status_label());
    if view.is_idle() {
        return Ok(());
    }

    println!();
    TimelinePrinter::new().print_new(&view);
    Ok(())
}
