use libretto::prelude::*;
use libretto_demos::{configured_models, flush_events, init_tracing, label};
use serde_json::json;

const SUPERVISOR_PROMPT: &str = "My role is to be the AI Coach Supervisor. \
I review the conversation between a coach and their client and suggest how the coach should \
answer the next question.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let middleware = LibrettoMiddleware::new(LibrettoConfig::from_env())?;
    for model in configured_models(&middleware)? {
        let options = CallOptions::messages(vec![
            Message::system(SUPERVISOR_PROMPT),
            Message::user("{prev_messages} {second_history}").as_chat_history(),
            Message::user("{coach_question}"),
        ])
        .with_libretto_options(
            LibrettoOptions::new()
                .prompt_template_name("vercel-ai-supervisor")
                .template_param(
                    "prev_messages",
                    json!([
                        {"role": "user", "content": "I am not feeling very good because of my home life."},
                        {"role": "assistant", "content": "I am sorry to hear that. What is going on at home?"}
                    ]),
                )
                .template_param(
                    "second_history",
                    json!([
                        {"role": "user", "content": "Thank you for the kind words."},
                        {"role": "assistant", "content": "You're welcome."}
                    ]),
                )
                .template_param("coach_question", "How do i get my employees to work harder?"),
        );

        let result = model.do_generate(options).await?;
        println!("[{}] {}", label(&model), result.text.unwrap_or_default());
    }

    flush_events(&middleware).await;
    Ok(())
}
