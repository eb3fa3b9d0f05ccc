use libretto::prelude::*;
use libretto_demos::{configured_models, flush_events, init_tracing, label};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let middleware = LibrettoMiddleware::new(LibrettoConfig::from_env())?;
    for model in configured_models(&middleware)? {
        let options = CallOptions::messages(vec![
            Message::system("You are a helpful assistant that addresses people in a {tone} tone."),
            Message::user("Hello, my name is {name}"),
        ])
        .with_libretto_options(
            LibrettoOptions::new()
                .prompt_template_name("vercelai-test-simple")
                .template_param("name", "Jamie")
                .template_param("tone", "funny"),
        );

        let result = model.do_generate(options).await?;
        println!("[{}] {}", label(&model), result.text.unwrap_or_default());
    }

    flush_events(&middleware).await;
    Ok(())
}
