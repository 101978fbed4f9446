//! Demo REPL: drive the sales workflow from stdin.
//!
//! With `COVERBOT__AI__API_KEY` set, extraction and intent run against
//! the configured LLM endpoint; without it, mock clients are wired and
//! the conversation only exercises the engine mechanics. State lives in
//! in-memory stores for the lifetime of the process.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use coverbot::adapters::ai::{
    LlmClient, LlmConfig, LlmExtractionClient, LlmIntentClassifier, MockExtractionClient,
    MockIntentClassifier,
};
use coverbot::adapters::insurance::{HttpInsuranceApi, InsuranceApiConfig, MockInsuranceApi};
use coverbot::adapters::memory::{InMemoryRunStore, InMemoryThreadStore};
use coverbot::application::{WorkflowRegistry, WorkflowRunner};
use coverbot::config::AppConfig;
use coverbot::domain::collection::{FieldValidators, HybridCollector};
use coverbot::domain::foundation::{ResourceId, ThreadId};
use coverbot::domain::workflow::{Message, WorkflowId};
use coverbot::ports::{ExtractionClient, InsuranceApi, IntentClassifier};
use coverbot::workflows::WorkflowToolkit;

fn render(message: &Message) -> String {
    match message {
        Message::Static { content } => content.clone(),
        Message::Error { content, .. } => format!("[error] {content}"),
        Message::Data { content, .. } => format!("[data] {content}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let (extraction, intent): (Arc<dyn ExtractionClient>, Arc<dyn IntentClassifier>) =
        if config.ai.has_api_key() {
            let llm_config = LlmConfig::new(config.ai.api_key.clone().unwrap_or_default())
                .with_model(config.ai.model.clone())
                .with_base_url(config.ai.base_url.clone())
                .with_timeout(config.ai.timeout());
            let client = LlmClient::new(llm_config)?;
            (
                Arc::new(LlmExtractionClient::new(client.clone())),
                Arc::new(LlmIntentClassifier::new(client)),
            )
        } else {
            eprintln!("No API key configured; using mock extraction and intent clients.");
            (
                Arc::new(MockExtractionClient::new()),
                Arc::new(MockIntentClassifier::new()),
            )
        };

    let api: Arc<dyn InsuranceApi> = if config.services.client_id.is_empty() {
        eprintln!("No platform credentials configured; using the mock policy platform.");
        Arc::new(MockInsuranceApi::new())
    } else {
        let api_config = InsuranceApiConfig::new(
            config.services.base_url.clone(),
            config.services.client_id.clone(),
            config.services.client_secret.clone(),
        )
        .with_timeout(config.services.timeout());
        Arc::new(HttpInsuranceApi::new(api_config)?)
    };

    let rules = config.validation.rules();
    let collector = Arc::new(HybridCollector::new(
        extraction,
        FieldValidators::new(rules),
    ));
    let toolkit = WorkflowToolkit::new(collector, intent, api, rules.max_claim_count);

    let runner = WorkflowRunner::new(
        WorkflowRegistry::new(&toolkit),
        Arc::new(InMemoryThreadStore::new()),
        Arc::new(InMemoryRunStore::new()),
    );

    let thread = ThreadId::new("repl");
    let resource = ResourceId::new("repl-user");

    println!("Coverbot sales demo. Type a message, or `quit` to exit.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") {
            break;
        }

        let messages = runner
            .handle_message(WorkflowId::SalesWorkflow, &thread, &resource, line)
            .await;
        for message in &messages {
            println!("{}", render(message));
        }
    }

    Ok(())
}
