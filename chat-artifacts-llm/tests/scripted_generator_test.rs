//! Tests for the scripted generator through the public trait

use chat_artifacts_llm::{
    ChatTurn, ChunkConfig, GenerationRequest, ScriptedGenerator, ScriptedReply, TextGenerator,
    TurnRole,
};
use futures::StreamExt;
use std::sync::Arc;

/// Streaming delivers the reply as several fragments that concatenate back
#[tokio::test]
async fn test_streaming_reassembles_reply() {
    let reply = "Here is a script:\n```python\nprint('hi')\n```\nDone.";
    let generator = ScriptedGenerator::new(ChunkConfig {
        chunk_size: 8,
        chunk_delay_ms: 0,
        word_boundary: true,
    })
    .with_reply(reply);

    let mut stream = generator
        .generate_streaming(&GenerationRequest::new("write a script"))
        .await
        .unwrap();

    let mut fragments = Vec::new();
    while let Some(fragment) = stream.next().await {
        fragments.push(fragment.unwrap());
    }

    assert!(fragments.len() > 1);
    assert_eq!(fragments.concat(), reply);
}

/// The generator sees history and system instruction exactly as sent
#[tokio::test]
async fn test_requests_are_recorded() {
    let generator = ScriptedGenerator::default().with_reply("ok");
    let request = GenerationRequest::new("and now?")
        .with_history(vec![ChatTurn::user("hello"), ChatTurn::model("hi there")])
        .with_system("be brief");

    generator.generate(&request).await.unwrap();

    let seen = generator.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].history[1].role, TurnRole::Model);
    assert_eq!(seen[0].system.as_deref(), Some("be brief"));
}

/// A failing script fails before any fragment is produced
#[tokio::test]
async fn test_streaming_fail_is_immediate() {
    let generator =
        ScriptedGenerator::default().with_outcome(ScriptedReply::Fail("quota exceeded".into()));

    let result = generator
        .generate_streaming(&GenerationRequest::new("hi"))
        .await;

    match result {
        Err(err) => assert_eq!(err.cause(), "quota exceeded"),
        Ok(_) => panic!("expected a generation failure"),
    }
}

/// One generator can be shared between tasks
#[tokio::test]
async fn test_shared_generator() {
    let generator = Arc::new(ScriptedGenerator::echo());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let generator = generator.clone();
            tokio::spawn(async move {
                generator
                    .generate(&GenerationRequest::new(format!("prompt {i}")))
                    .await
                    .unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), format!("prompt {i}"));
    }
    assert_eq!(generator.requests().len(), 4);
}
