//! Concurrent question fan-out against a single pipeline
//!
//! All questions run concurrently up to a bound. The first failure fails the
//! batch and drops the queries still in flight. Answers come back in question
//! order regardless of completion order.

use std::time::Duration;

use futures::stream;
use futures::StreamExt;
use futures::TryStreamExt;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::PolicyQaError;
use crate::errors::Result;
use crate::rag::Pipeline;

/// Fan-out limits
#[derive(Debug, Clone, Copy)]
pub struct FanOutOptions {
    pub max_concurrency: usize,
    pub query_timeout: Option<Duration>,
}

impl Default for FanOutOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            query_timeout: None,
        }
    }
}

impl FanOutOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_concurrency: config.rag.max_concurrent_queries.max(1),
            query_timeout: config.rag.query_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Answer every question against `pipeline`, preserving input order.
///
/// # Errors
/// The first failing query's error, or `QueryError` on timeout
pub async fn answer_all(
    pipeline: &dyn Pipeline,
    questions: &[String],
    options: FanOutOptions,
) -> Result<Vec<String>> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    debug!(
        "Fanning out {} questions (concurrency {})",
        questions.len(),
        options.max_concurrency
    );

    let mut answers: Vec<(usize, String)> = stream::iter(questions.iter().enumerate())
        .map(|(index, question)| async move {
            let answer = match options.query_timeout {
                Some(limit) => tokio::time::timeout(limit, pipeline.query(question))
                    .await
                    .map_err(|_| {
                        PolicyQaError::QueryError(format!(
                            "Question {index} timed out after {}s",
                            limit.as_secs_f32()
                        ))
                    })??,
                None => pipeline.query(question).await?,
            };
            Ok::<_, PolicyQaError>((index, answer.result))
        })
        .buffer_unordered(options.max_concurrency.max(1))
        .try_collect()
        .await?;

    answers.sort_unstable_by_key(|(index, _)| *index);
    Ok(answers.into_iter().map(|(_, answer)| answer).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;

    use super::*;
    use crate::rag::QueryAnswer;

    /// Later questions finish first; "fail" and "hang" misbehave
    #[derive(Default)]
    struct ScriptedPipeline {
        started: AtomicUsize,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl Pipeline for ScriptedPipeline {
        async fn query(&self, question: &str) -> Result<QueryAnswer> {
            let n = self.started.fetch_add(1, Ordering::SeqCst);
            match question {
                "fail" => {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Err(PolicyQaError::QueryError("boom".to_string()))
                }
                "hang" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    self.completed.fetch_add(1, Ordering::SeqCst);
                    Ok(QueryAnswer::new("late".to_string()))
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(n as u64 * 10)))
                        .await;
                    self.completed.fetch_add(1, Ordering::SeqCst);
                    Ok(QueryAnswer::new(format!("answer to {question}")))
                }
            }
        }
    }

    fn questions(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_answers_keep_question_order() {
        let pipeline = ScriptedPipeline::default();
        let answers = answer_all(
            &pipeline,
            &questions(&["a", "b", "c", "d"]),
            FanOutOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            answers,
            vec!["answer to a", "answer to b", "answer to c", "answer to d"]
        );
    }

    #[tokio::test]
    async fn test_duplicate_questions_are_answered_independently() {
        let pipeline = ScriptedPipeline::default();
        let answers = answer_all(&pipeline, &questions(&["x", "x"]), FanOutOptions::default())
            .await
            .unwrap();

        assert_eq!(answers.len(), 2);
        assert_eq!(pipeline.started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_questions() {
        let pipeline = ScriptedPipeline::default();
        let answers = answer_all(&pipeline, &[], FanOutOptions::default())
            .await
            .unwrap();
        assert!(answers.is_empty());
        assert_eq!(pipeline.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_failure_fails_batch_without_waiting() {
        let pipeline = ScriptedPipeline::default();
        let started = std::time::Instant::now();

        let err = answer_all(
            &pipeline,
            &questions(&["a", "fail", "hang"]),
            FanOutOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PolicyQaError::QueryError(_)));
        // The hanging sibling is dropped, not awaited
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(pipeline.started.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_query_timeout() {
        let pipeline = ScriptedPipeline::default();
        let options = FanOutOptions {
            max_concurrency: 4,
            query_timeout: Some(Duration::from_millis(100)),
        };

        let err = answer_all(&pipeline, &questions(&["a", "hang"]), options)
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyQaError::QueryError(ref msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_concurrency_of_one_is_sequential() {
        let pipeline = ScriptedPipeline::default();
        let options = FanOutOptions {
            max_concurrency: 1,
            query_timeout: None,
        };

        let answers = answer_all(&pipeline, &questions(&["a", "b"]), options)
            .await
            .unwrap();
        assert_eq!(answers, vec!["answer to a", "answer to b"]);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = AppConfig::default();
        config.rag.max_concurrent_queries = 4;
        config.rag.query_timeout_secs = Some(30);

        let options = FanOutOptions::from_config(&config);
        assert_eq!(options.max_concurrency, 4);
        assert_eq!(options.query_timeout, Some(Duration::from_secs(30)));
    }
}
