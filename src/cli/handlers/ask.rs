//! One-shot question answering from the command line

use std::time::Instant;

use crate::api::fanout::answer_all;
use crate::api::fanout::FanOutOptions;
use crate::api::types::QuestionResponse;
use crate::cli::output::*;
use crate::rag::DocumentPipelineFactory;
use crate::rag::PipelineFactory;
use crate::AppConfig;
use crate::Result;

/// Build a pipeline for `document` and answer `questions` in order
pub async fn handle_ask(
    config: &AppConfig,
    document: String,
    questions: Vec<String>,
    json: bool,
) -> Result<()> {
    let start = Instant::now();

    if !json {
        print_info(&format!("Loading {document}..."));
    }
    let factory = DocumentPipelineFactory::new(config)?;
    let pipeline = factory.build(&document).await?;

    if !json {
        print_info(&format!("Answering {} questions...", questions.len()));
    }
    let answers = answer_all(
        pipeline.as_ref(),
        &questions,
        FanOutOptions::from_config(config),
    )
    .await?;

    if json {
        let body = serde_json::to_string_pretty(&QuestionResponse { answers })?;
        println!("{body}");
    } else {
        print_answers(&questions, &answers);
        print_success(&format!(
            "Answered {} questions in {:.2}s",
            questions.len(),
            start.elapsed().as_secs_f64()
        ));
    }

    Ok(())
}
