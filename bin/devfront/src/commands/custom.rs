use std::sync::Arc;

use devfront_fronts::{CustomHighlighterFront, NodeRef};

use super::{connect, form_for, parse_json_arg};

pub async fn show(endpoint: Option<String>, actor: &str, node: &str, options: Option<&str>) -> anyhow::Result<()> {
    let options = parse_json_arg("options", options)?;
    let session = connect(endpoint).await?;
    let front: Arc<CustomHighlighterFront> = session
        .client
        .get_front("customhighlighter", form_for(actor, None)?)
        .await?;

    match front.show(&NodeRef::new(node), options).await? {
        Some(true) => println!("Shown"),
        Some(false) => println!("Nothing to show for {}", node),
        None => println!("Show sent"),
    }
    Ok(())
}

pub async fn hide(endpoint: Option<String>, actor: &str) -> anyhow::Result<()> {
    let session = connect(endpoint).await?;
    let front: Arc<CustomHighlighterFront> = session
        .client
        .get_front("customhighlighter", form_for(actor, None)?)
        .await?;
    front.hide().await?;
    println!("Hidden");
    Ok(())
}
