use std::time::Duration;

use devfront_fronts::{pick_method, BoxModelOptions, HighlighterFront, NodeRef};
use tracing::info;

use super::{connect, form_for};

pub async fn pick(
    endpoint: Option<String>,
    highlighter: &str,
    traits: Option<&str>,
    focus: bool,
) -> anyhow::Result<()> {
    let session = connect(endpoint).await?;
    let front: std::sync::Arc<HighlighterFront> = session
        .client
        .get_front("highlighter", form_for(highlighter, traits)?)
        .await?;

    let method = pick_method(focus, front.capabilities());
    front.pick(focus).await?;
    info!(focus, method = method.as_str(), "picker started");
    println!("Picker started on {} ({})", highlighter, method.as_str());
    Ok(())
}

pub async fn cancel_pick(endpoint: Option<String>, highlighter: &str) -> anyhow::Result<()> {
    let session = connect(endpoint).await?;
    let front: std::sync::Arc<HighlighterFront> = session
        .client
        .get_front("highlighter", form_for(highlighter, None)?)
        .await?;
    front.cancel_pick().await?;
    println!("Picker canceled");
    Ok(())
}

pub async fn highlight(
    endpoint: Option<String>,
    highlighter: &str,
    node: &str,
    region: Option<String>,
    hold_ms: u64,
    force: bool,
) -> anyhow::Result<()> {
    let session = connect(endpoint).await?;
    let flags = session.config.runtime_flags();
    let front: std::sync::Arc<HighlighterFront> = session
        .client
        .get_front("highlighter", form_for(highlighter, None)?)
        .await?;

    let node = NodeRef::new(node);
    let options = BoxModelOptions {
        region,
        ..BoxModelOptions::default()
    };
    front.highlight(Some(&node), options).await?;
    println!("Highlighted {}", node.actor);

    tokio::time::sleep(Duration::from_millis(hold_ms)).await;

    front.unhighlight(force, flags).await?;
    if front.is_node_highlighted() {
        println!("Highlight kept (testing mode, use --force to hide)");
    } else {
        println!("Unhighlighted {}", node.actor);
    }
    Ok(())
}

pub async fn hide(endpoint: Option<String>, highlighter: &str) -> anyhow::Result<()> {
    let session = connect(endpoint).await?;
    let front: std::sync::Arc<HighlighterFront> = session
        .client
        .get_front("highlighter", form_for(highlighter, None)?)
        .await?;
    front.hide_box_model().await?;
    println!("Hidden");
    Ok(())
}
