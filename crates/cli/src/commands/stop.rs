// Stop command

use anyhow::Result;
use parley_core::ConversationScope;

use crate::client::Client;
use crate::output::{print_field, OutputFormat};

pub async fn run(
    client: &Client,
    output: OutputFormat,
    project: String,
    conversation: String,
) -> Result<()> {
    let controller = client
        .open(ConversationScope::new(project, conversation))
        .await?;
    controller.stop().await?;

    let view = controller.view();
    controller.close();

    if output.is_text() {
        if let Some(run_id) = &view.run_id {
            print_field("Run", run_id);
        }
        print_field("Status", &view.status_label());
        println!("Stop requested");
    } else {
        output.print_value(&view)?;
    }
    Ok(())
}
