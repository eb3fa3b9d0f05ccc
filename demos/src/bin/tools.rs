use libretto::prelude::*;
use libretto::{CallMode, ToolDefinition};
use libretto_demos::{configured_models, flush_events, init_tracing, label};
use serde_json::json;

fn weather_tool() -> ToolDefinition {
    ToolDefinition::new(
        "weather",
        "Get the weather in a location",
        json!({
            "type": "object",
            "properties": {
                "location": {"type": "string", "description": "The location to get the weather for"}
            },
            "required": ["location"]
        }),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let middleware = LibrettoMiddleware::new(LibrettoConfig::from_env())?;
    for model in configured_models(&middleware)? {
        let options = CallOptions::messages(vec![Message::user(
            "What's the weather like in {location}?",
        )])
        .with_mode(CallMode::regular(vec![weather_tool()]))
        .with_libretto_options(
            LibrettoOptions::new()
                .prompt_template_name("vercelai-test-tools")
                .template_param("location", "San Francisco"),
        );

        let result = model.do_generate(options).await?;
        for call in &result.tool_calls {
            println!("[{}] {}({})", label(&model), call.tool_name, call.args);
        }
        if let Some(text) = result.text.filter(|text| !text.is_empty()) {
            println!("[{}] {}", label(&model), text);
        }
    }

    flush_events(&middleware).await;
    Ok(())
}
