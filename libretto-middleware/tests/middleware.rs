use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{json, Map};
use tokio::sync::mpsc;
use tokio::time::timeout;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use libretto_client::{EventRecord, EventSink, LibrettoClientError, LibrettoConfig};
use libretto_core::{
    CallOptions, ContentPart, FinishReason, GenerateResult, LanguageModel, LibrettoError,
    LibrettoOptions, Message, MessageContent, RawCall, Role, Usage,
};
use libretto_middleware::{wrap_language_model, FlushError, LibrettoMiddleware};

#[derive(Clone, Default)]
struct StubModel {
    seen: Arc<Mutex<Vec<CallOptions>>>,
    fail: bool,
}

impl StubModel {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    fn provider(&self) -> &str {
        "openai.chat"
    }

    fn model_id(&self) -> &str {
        "gpt-4o-mini"
    }

    async fn do_generate(&self, options: CallOptions) -> Result<GenerateResult, LibrettoError> {
        self.seen.lock().unwrap().push(options);
        if self.fail {
            return Err(LibrettoError::Provider("rate limited".to_string()));
        }
        let mut raw_settings = Map::new();
        raw_settings.insert("temperature".to_string(), json!(1.0));
        raw_settings.insert("system".to_string(), json!("dup"));
        Ok(GenerateResult {
            text: Some("Hi Jamie!".to_string()),
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens: 20,
                completion_tokens: 3,
            },
            raw_call: RawCall {
                raw_prompt: json!([]),
                raw_settings,
            },
            ..GenerateResult::default()
        })
    }
}

struct ChannelSink {
    events: mpsc::UnboundedSender<EventRecord>,
    fail: bool,
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&self, event: EventRecord) -> Result<(), LibrettoClientError> {
        let _ = self.events.send(event);
        if self.fail {
            return Err(LibrettoClientError::Sink("backend unavailable".to_string()));
        }
        Ok(())
    }
}

struct SlowSink {
    delay: Duration,
    delivered: Arc<AtomicUsize>,
}

#[async_trait]
impl EventSink for SlowSink {
    async fn send(&self, _event: EventRecord) -> Result<(), LibrettoClientError> {
        tokio::time::sleep(self.delay).await;
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn channel_middleware(fail: bool) -> (LibrettoMiddleware, mpsc::UnboundedReceiver<EventRecord>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = Arc::new(ChannelSink { events: tx, fail });
    (LibrettoMiddleware::with_sink(sink), rx)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<EventRecord>) -> EventRecord {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event dispatched in time")
        .expect("sink still open")
}

fn simple_options() -> CallOptions {
    CallOptions::messages(vec![
        Message::system("You are a helpful assistant that addresses people in a {tone} tone."),
        Message::user("Hello, my name is {name}"),
    ])
    .with_libretto_options(
        LibrettoOptions::new()
            .prompt_template_name("vercelai-test-simple")
            .template_param("name", "Jamie")
            .template_param("tone", "funny"),
    )
}

#[tokio::test]
async fn transform_params_resolves_template_and_captures_it() {
    let (middleware, _rx) = channel_middleware(false);

    let params = middleware.transform_params(simple_options()).unwrap();

    assert_eq!(
        params.prompt,
        vec![
            Message::system("You are a helpful assistant that addresses people in a funny tone."),
            Message::user("Hello, my name is Jamie"),
        ]
    );
    let template_chat = params
        .libretto_options()
        .and_then(|options| options.template_chat.clone())
        .unwrap();
    assert_eq!(template_chat[1], Message::user("Hello, my name is {name}"));
}

#[tokio::test]
async fn transform_params_keeps_explicit_template_chat() {
    let (middleware, _rx) = channel_middleware(false);
    let explicit = vec![Message::user("stored template")];
    let mut options = simple_options();
    options.libretto_options_mut().template_chat = Some(explicit.clone());

    let params = middleware.transform_params(options).unwrap();

    assert_eq!(
        params.libretto_options().unwrap().template_chat,
        Some(explicit)
    );
}

#[tokio::test]
async fn transform_params_expands_and_standardizes_chat_history() {
    let (middleware, _rx) = channel_middleware(false);
    let options = CallOptions::messages(vec![
        Message::system("My role is to be the AI Coach Supervisor."),
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
                    {"role": "assistant", "content": "I am sorry to hear that."}
                ]),
            )
            .template_param(
                "second_history",
                json!([
                    {"role": "user", "content": "Thank you for the kind words."},
                    {"role": "assistant", "content": "You're welcome"}
                ]),
            )
            .template_param("coach_question", "How do i get my employees to work harder?"),
    );

    let params = middleware.transform_params(options).unwrap();

    assert_eq!(params.prompt.len(), 6);
    assert_eq!(
        params.prompt[0].content,
        MessageContent::Text("My role is to be the AI Coach Supervisor.".to_string())
    );
    assert_eq!(params.prompt[2].role, Role::Assistant);
    assert_eq!(
        params.prompt[2].content,
        MessageContent::Parts(vec![ContentPart::text("I am sorry to hear that.")])
    );
    assert_eq!(
        params.prompt[5].content,
        MessageContent::Parts(vec![ContentPart::text(
            "How do i get my employees to work harder?"
        )])
    );
    assert!(params
        .prompt
        .iter()
        .all(|message| message.provider_metadata.is_none()));

    let template_chat = params.libretto_options().unwrap().template_chat.clone().unwrap();
    assert_eq!(template_chat[1].role, Role::ChatHistory);
}

#[tokio::test]
async fn wrapped_model_returns_result_and_dispatches_event() {
    let (middleware, mut rx) = channel_middleware(false);
    let model = StubModel::default();
    let wrapped = wrap_language_model(model.clone(), middleware);

    let result = wrapped.do_generate(simple_options()).await.unwrap();

    assert_eq!(result.text.as_deref(), Some("Hi Jamie!"));
    let sent = model.seen.lock().unwrap()[0].prompt.clone();
    assert_eq!(sent[1], Message::user("Hello, my name is Jamie"));

    let event = next_event(&mut rx).await;
    assert_eq!(event.model_parameters.model_provider, "openai");
    assert_eq!(event.model_parameters.model, "gpt-4o-mini");
    assert_eq!(event.model_parameters.settings.get("temperature"), Some(&json!(1.0)));
    assert!(!event.model_parameters.settings.contains_key("system"));
    assert_eq!(event.params.get("name"), Some(&json!("Jamie")));
    assert_eq!(
        event.prompt_template_chat[1],
        Message::user("Hello, my name is {name}")
    );
    assert_eq!(event.response.as_deref(), Some("Hi Jamie!"));
}

#[tokio::test]
async fn sink_failure_does_not_affect_result() {
    let (middleware, mut rx) = channel_middleware(true);
    let wrapped = wrap_language_model(StubModel::default(), middleware);

    let result = wrapped.do_generate(simple_options()).await;

    assert_eq!(result.unwrap().text.as_deref(), Some("Hi Jamie!"));
    let event = next_event(&mut rx).await;
    assert_eq!(event.response.as_deref(), Some("Hi Jamie!"));
}

#[tokio::test]
async fn provider_failure_propagates_without_event() {
    let (middleware, mut rx) = channel_middleware(false);
    let wrapped = wrap_language_model(StubModel::failing(), middleware);

    let err = wrapped.do_generate(simple_options()).await.unwrap_err();

    assert!(matches!(err, LibrettoError::Provider(reason) if reason == "rate limited"));
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn redact_pii_flag_passes_event_through() {
    let (middleware, mut rx) = channel_middleware(false);
    let wrapped = wrap_language_model(StubModel::default(), middleware);
    let mut options = simple_options();
    options.libretto_options_mut().redact_pii = true;

    wrapped.do_generate(options).await.unwrap();

    let event = next_event(&mut rx).await;
    assert_eq!(event.response.as_deref(), Some("Hi Jamie!"));
    assert_eq!(event.params.get("name"), Some(&json!("Jamie")));
}

#[tokio::test]
async fn uploads_event_to_libretto_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/event"))
        .and(body_partial_json(json!({
            "apiKey": "default-key",
            "promptTemplateName": "vercelai-test-simple",
            "response": "Hi Jamie!",
            "modelParameters": {"modelProvider": "openai", "modelType": "chat"}
        })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = LibrettoConfig::new()
        .with_api_url(server.uri())
        .with_api_key("default-key");
    let middleware = LibrettoMiddleware::new(config).unwrap();
    let wrapped = wrap_language_model(StubModel::default(), middleware);

    wrapped.do_generate(simple_options()).await.unwrap();

    let received = timeout(Duration::from_secs(2), async {
        loop {
            let requests = server.received_requests().await.unwrap_or_default();
            if !requests.is_empty() {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("event uploaded");
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["apiKey"], "default-key");
    assert_eq!(body["modelParameters"]["model"], "gpt-4o-mini");
    assert!(body["modelParameters"].get("system").is_none());
}

#[tokio::test]
async fn default_api_key_is_injected_not_read_from_env() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let middleware = LibrettoMiddleware::with_sink(Arc::new(ChannelSink {
        events: tx,
        fail: false,
    }))
    .with_default_api_key(SecretString::new("injected".to_string()));
    let wrapped = wrap_language_model(StubModel::default(), middleware);

    wrapped.do_generate(simple_options()).await.unwrap();

    let event = next_event(&mut rx).await;
    assert!(event.api_key.is_some());
}

#[tokio::test]
async fn flush_waits_for_slow_uploads() {
    let delivered = Arc::new(AtomicUsize::new(0));
    let middleware = LibrettoMiddleware::with_sink(Arc::new(SlowSink {
        delay: Duration::from_millis(200),
        delivered: Arc::clone(&delivered),
    }));
    let wrapped = wrap_language_model(StubModel::default(), middleware.clone());

    wrapped.do_generate(simple_options()).await.unwrap();
    wrapped.do_generate(simple_options()).await.unwrap();
    assert_eq!(middleware.pending_uploads(), 2);

    let flushed = middleware.flush(Duration::from_secs(5)).await.unwrap();

    assert_eq!(flushed, 2);
    assert_eq!(delivered.load(Ordering::SeqCst), 2);
    assert_eq!(middleware.pending_uploads(), 0);
}

#[tokio::test]
async fn flush_reports_uploads_still_running_at_deadline() {
    let delivered = Arc::new(AtomicUsize::new(0));
    let middleware = LibrettoMiddleware::with_sink(Arc::new(SlowSink {
        delay: Duration::from_secs(30),
        delivered: Arc::clone(&delivered),
    }));
    let wrapped = wrap_language_model(StubModel::default(), middleware.clone());

    wrapped.do_generate(simple_options()).await.unwrap();

    let err = middleware.flush(Duration::from_millis(50)).await.unwrap_err();

    assert!(matches!(err, FlushError::Timeout { pending: 1, .. }));
    assert_eq!(delivered.load(Ordering::SeqCst), 0);
}
