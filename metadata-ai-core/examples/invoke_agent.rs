//! Invoke an agent, stream a reply, and run the continuation orchestrator
//!
//! Reads `AI_SDK_HOST` and `AI_SDK_TOKEN` from the environment.
//!
//! Run with: cargo run --example invoke_agent -- <agent-name> "<message>"

use anyhow::Context;
use futures::StreamExt;
use metadata_ai_core::protocol::{InvokeRequest, StreamEvent};
use metadata_ai_core::{ClientConfig, MetadataAI};
use serde_json::Map;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let agent_name = args.next().context("usage: invoke_agent <agent-name> <message>")?;
    let message = args.next().unwrap_or_else(|| "What can you help me with?".to_string());

    let config = ClientConfig::from_env().context("loading AI_SDK_* configuration")?;
    let client = MetadataAI::new(config)?;
    let agent = client.agent(&agent_name);

    let info = agent.get_info().await?;
    println!("Agent: {} ({} abilities)", info.name, info.abilities.len());

    let reply = agent.call(&message).await?;
    println!("\n[invoke] {}", reply.response);

    println!("\n[stream]");
    let mut events = agent
        .stream(InvokeRequest::new().with_message(&message))
        .await?;
    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Content { text, .. } => print!("{text}"),
            StreamEvent::ToolUse { tool_name, .. } => println!("\n  -> using {tool_name}"),
            StreamEvent::Error { message, .. } => println!("\n  !! {message}"),
            _ => {}
        }
    }
    println!();

    let result = client.orchestrator(&agent_name).run(message, Map::new()).await?;
    println!(
        "\n[orchestrated] {} turn(s), complete: {}, tools: {:?}\n{}",
        result.turns, result.complete, result.tools_used, result.response
    );

    let tools = client.mcp().list_tools().await?;
    println!("\n{} MCP tool(s) available", tools.len());

    Ok(())
}
