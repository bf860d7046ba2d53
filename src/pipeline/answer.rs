use std::sync::Arc;

use thiserror::Error;

use crate::database::{ScoredPassage, VectorDbError, VectorIndex};
use crate::llm::{ChatError, ChatProvider, EmbeddingError, TextEmbedder};

/// Returned whenever the model has nothing grounded to say: empty
/// collections, no matching passages, or an empty completion.
pub const FALLBACK_ANSWER: &str = "I don't know the answer to that question, \
     please ask something related to the uploaded document.";

const GROUNDING_INSTRUCTION: &str = "You are a helpful assistant answering questions strictly \
     based on the context extracted from a PDF uploaded by the user.\n\
     If the question is unrelated to the provided content, reply with:\n\
     \"I don't know the answer to that question, please ask something related to the uploaded \
     document.\"";

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("collection id must not be empty")]
    EmptyCollectionId,
    #[error("collection {0} not found")]
    CollectionNotFound(String),
    #[error("question embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("retrieval failed: {0}")]
    Retrieval(VectorDbError),
    #[error(transparent)]
    Completion(#[from] ChatError),
}

/// Embeds the question, retrieves the top-k passages from one collection,
/// and asks the chat model to answer from that context alone.
///
/// Read-only over collections; never creates or mutates one.
pub struct AnswerComposer {
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn ChatProvider>,
    top_k: u64,
    question_max_len: usize,
}

impl AnswerComposer {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatProvider>,
        top_k: u64,
        question_max_len: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
            top_k,
            question_max_len,
        }
    }

    pub async fn answer(&self, collection_id: &str, question: &str) -> Result<String, AnswerError> {
        if question.trim().is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }
        if collection_id.trim().is_empty() {
            return Err(AnswerError::EmptyCollectionId);
        }

        // Retrieval sees a bounded, normalized copy; the model gets the
        // question exactly as the user wrote it.
        let retrieval_query = normalize_question(question, self.question_max_len);
        let query_vector = self.embedder.embed(&retrieval_query).await?;

        let passages = match self
            .index
            .search(collection_id, query_vector, self.top_k)
            .await
        {
            Ok(passages) => passages,
            Err(VectorDbError::CollectionNotFound(name)) => {
                return Err(AnswerError::CollectionNotFound(name))
            }
            Err(e) => return Err(AnswerError::Retrieval(e)),
        };

        if passages.is_empty() {
            log::info!("no passages retrieved from {}", collection_id);
            return Ok(FALLBACK_ANSWER.to_string());
        }
        log::info!(
            "retrieved {} passages from {}",
            passages.len(),
            collection_id
        );

        let system_prompt = grounded_prompt(&passages);
        match self.chat.complete(&system_prompt, question).await? {
            Some(answer) => Ok(answer),
            None => Ok(FALLBACK_ANSWER.to_string()),
        }
    }
}

fn normalize_question(question: &str, max_len: usize) -> String {
    question.trim().to_lowercase().chars().take(max_len).collect()
}

/// Numbered context blocks in descending similarity order, under a fixed
/// instruction restricting the model to that context.
fn grounded_prompt(passages: &[ScoredPassage]) -> String {
    let context = passages
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("Result {}:\n{}\n", i + 1, passage.text))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n\nContext:\n\n{}", GROUNDING_INSTRUCTION, context)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct CapturingEmbedder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextEmbedder for CapturingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(vec![0.5; 4])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
        }
    }

    enum IndexBehavior {
        Hits(Vec<ScoredPassage>),
        Missing,
    }

    struct FixedIndex {
        behavior: IndexBehavior,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn create_collection(&self, _: &str, _: u64) -> Result<(), VectorDbError> {
            unreachable!("composer never creates collections")
        }

        async fn upsert(
            &self,
            _: &str,
            _: Vec<crate::database::PassagePoint>,
        ) -> Result<(), VectorDbError> {
            unreachable!("composer never writes")
        }

        async fn search(
            &self,
            collection: &str,
            _vector: Vec<f32>,
            limit: u64,
        ) -> Result<Vec<ScoredPassage>, VectorDbError> {
            match &self.behavior {
                IndexBehavior::Hits(passages) => {
                    Ok(passages.iter().take(limit as usize).cloned().collect())
                }
                IndexBehavior::Missing => {
                    Err(VectorDbError::CollectionNotFound(collection.to_string()))
                }
            }
        }
    }

    struct ScriptedChat {
        reply: Option<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ChatProvider for ScriptedChat {
        async fn complete(
            &self,
            system_prompt: &str,
            user_message: &str,
        ) -> Result<Option<String>, ChatError> {
            self.calls
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_message.to_string()));
            Ok(self.reply.clone())
        }
    }

    fn hit(text: &str, score: f32) -> ScoredPassage {
        ScoredPassage {
            text: text.to_string(),
            score,
        }
    }

    fn composer(
        behavior: IndexBehavior,
        reply: Option<String>,
    ) -> (AnswerComposer, Arc<CapturingEmbedder>, Arc<ScriptedChat>) {
        let embedder = Arc::new(CapturingEmbedder {
            seen: Mutex::new(Vec::new()),
        });
        let chat = Arc::new(ScriptedChat {
            reply,
            calls: Mutex::new(Vec::new()),
        });
        let composer = AnswerComposer::new(
            embedder.clone(),
            Arc::new(FixedIndex { behavior }),
            chat.clone(),
            3,
            500,
        );
        (composer, embedder, chat)
    }

    #[tokio::test]
    async fn rejects_blank_inputs() {
        let (composer, _, _) = composer(IndexBehavior::Hits(Vec::new()), None);
        assert!(matches!(
            composer.answer("letters_ab12cd34", "   ").await,
            Err(AnswerError::EmptyQuestion)
        ));
        assert!(matches!(
            composer.answer("", "What happens in chapter one?").await,
            Err(AnswerError::EmptyCollectionId)
        ));
    }

    #[tokio::test]
    async fn retrieval_uses_normalized_question_and_chat_gets_the_original() {
        let question = format!("  What Is {}? ", "Dumbledore's Role".repeat(40));
        let (composer, embedder, chat) = composer(
            IndexBehavior::Hits(vec![hit("Dumbledore is the headmaster.", 0.9)]),
            Some("He runs Hogwarts.".to_string()),
        );

        let answer = composer.answer("hp_ab12cd34", &question).await.unwrap();
        assert_eq!(answer, "He runs Hogwarts.");

        let seen = embedder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].chars().count(), 500);
        assert!(seen[0].starts_with("what is dumbledore's role"));

        let calls = chat.calls.lock().unwrap();
        assert_eq!(calls[0].1, question, "user turn must be untruncated");
    }

    #[tokio::test]
    async fn prompt_numbers_passages_in_descending_score_order() {
        let (composer, _, chat) = composer(
            IndexBehavior::Hits(vec![
                hit("best match", 0.91),
                hit("second match", 0.72),
                hit("third match", 0.55),
            ]),
            Some("grounded answer".to_string()),
        );

        composer.answer("hp_ab12cd34", "who?").await.unwrap();

        let calls = chat.calls.lock().unwrap();
        let system = &calls[0].0;
        let first = system.find("Result 1:\nbest match").unwrap();
        let second = system.find("Result 2:\nsecond match").unwrap();
        let third = system.find("Result 3:\nthird match").unwrap();
        assert!(first < second && second < third);
        assert!(system.contains("strictly"));
    }

    #[tokio::test]
    async fn empty_collection_degrades_to_fallback_not_error() {
        let (composer, _, chat) = composer(IndexBehavior::Hits(Vec::new()), None);

        let answer = composer.answer("fresh_ab12cd34", "anything?").await.unwrap();
        assert_eq!(answer, FALLBACK_ANSWER);
        assert!(chat.calls.lock().unwrap().is_empty(), "no model call without context");
    }

    #[tokio::test]
    async fn empty_completion_degrades_to_fallback() {
        let (composer, _, _) = composer(
            IndexBehavior::Hits(vec![hit("some context", 0.8)]),
            None,
        );

        let answer = composer.answer("hp_ab12cd34", "who?").await.unwrap();
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn missing_collection_is_reported_as_such() {
        let (composer, _, _) = composer(IndexBehavior::Missing, None);

        let err = composer.answer("ghost_ab12cd34", "who?").await.unwrap_err();
        match err {
            AnswerError::CollectionNotFound(name) => assert_eq!(name, "ghost_ab12cd34"),
            other => panic!("expected CollectionNotFound, got {other:?}"),
        }
    }
}
