// Tests for transcript assembly and the append-only conversation log
//
// These cover the turn-commit rules: cumulative delta concatenation, trim,
// the at-most-one-message-per-speaker-per-turn guarantee, and de-duplication
// of redelivered user utterances.

use viva::transcript::{ConversationMessage, Speaker, TranscriptAssembler, TranscriptLog};

#[tokio::test]
async fn test_user_deltas_commit_as_single_message() {
    // Mic input "介绍一下你自己" arriving as three partial deltas
    let log = TranscriptLog::new();
    let mut assembler = TranscriptAssembler::new();

    assembler.push_user("介绍");
    assembler.push_user("一下");
    assembler.push_user("你自己");
    assert_eq!(assembler.user_preview(), "介绍一下你自己");

    let appended = assembler.commit(&log).await;

    assert_eq!(appended, 1);
    let messages = log.snapshot().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].speaker, Speaker::User);
    assert_eq!(messages[0].text, "介绍一下你自己");
}

#[tokio::test]
async fn test_turn_commits_user_and_agent_in_order() {
    let log = TranscriptLog::new();
    let mut assembler = TranscriptAssembler::new();

    assembler.push_user("我有五年工作经验");
    assembler.push_agent("好的，");
    assembler.push_agent("请具体介绍一个项目。");

    let appended = assembler.commit(&log).await;

    assert_eq!(appended, 2);
    let messages = log.snapshot().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].speaker, Speaker::User);
    assert_eq!(messages[1].speaker, Speaker::Agent);
    assert_eq!(messages[1].text, "好的，请具体介绍一个项目。");
}

#[tokio::test]
async fn test_empty_turn_is_a_noop() {
    let log = TranscriptLog::new();
    let mut assembler = TranscriptAssembler::new();

    assert_eq!(assembler.commit(&log).await, 0);
    assert!(log.is_empty().await);

    // Whitespace-only accumulators trim to empty and are also dropped
    assembler.push_user("   ");
    assembler.push_agent("\n");
    assert_eq!(assembler.commit(&log).await, 0);
    assert!(log.is_empty().await);
}

#[tokio::test]
async fn test_redelivered_user_text_is_deduplicated() {
    let log = TranscriptLog::new();
    let mut assembler = TranscriptAssembler::new();

    assembler.push_user("你好");
    assert_eq!(assembler.commit(&log).await, 1);

    // The same utterance redelivered in the next turn must not double-append
    assembler.push_user("你好");
    assert_eq!(assembler.commit(&log).await, 0);

    let messages = log.snapshot().await;
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn test_dedup_is_exact_match_only() {
    // A trailing-punctuation variant is a different utterance and is kept
    let log = TranscriptLog::new();
    let mut assembler = TranscriptAssembler::new();

    assembler.push_user("好");
    assembler.commit(&log).await;
    assembler.push_user("好。");
    assembler.commit(&log).await;

    assert_eq!(log.len().await, 2);
}

#[tokio::test]
async fn test_dedup_checks_most_recent_message_of_any_speaker() {
    let log = TranscriptLog::new();
    log.append(ConversationMessage::new(Speaker::User, "你好")).await;
    log.append(ConversationMessage::new(Speaker::Agent, "请继续。")).await;

    // The last appended message is the agent's, so the user text no longer
    // matches and is appended again
    let appended = log.commit_turn("你好", "").await;
    assert_eq!(appended, 1);
    assert_eq!(log.len().await, 3);
}

#[tokio::test]
async fn test_commit_trims_before_appending() {
    let log = TranscriptLog::new();
    let appended = log.commit_turn("  你好  ", " 欢迎。 ").await;

    assert_eq!(appended, 2);
    let messages = log.snapshot().await;
    assert_eq!(messages[0].text, "你好");
    assert_eq!(messages[1].text, "欢迎。");
}

#[tokio::test]
async fn test_accumulators_reset_after_commit() {
    let log = TranscriptLog::new();
    let mut assembler = TranscriptAssembler::new();

    assembler.push_user("第一轮");
    assembler.commit(&log).await;
    assert_eq!(assembler.user_preview(), "");

    assembler.push_user("第二轮");
    assembler.commit(&log).await;

    let messages = log.snapshot().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "第二轮");
}

#[tokio::test]
async fn test_reset_discards_uncommitted_text() {
    let log = TranscriptLog::new();
    let mut assembler = TranscriptAssembler::new();

    assembler.push_user("没说完的");
    assembler.reset();
    assert_eq!(assembler.commit(&log).await, 0);
    assert!(log.is_empty().await);
}

#[tokio::test]
async fn test_agent_only_turn() {
    // An opening question with no user speech commits one agent message
    let log = TranscriptLog::new();
    let appended = log.commit_turn("", "请介绍一下你自己。").await;

    assert_eq!(appended, 1);
    let messages = log.snapshot().await;
    assert_eq!(messages[0].speaker, Speaker::Agent);
}

#[tokio::test]
async fn test_last_text() {
    let log = TranscriptLog::new();
    assert_eq!(log.last_text().await, None);

    log.append(ConversationMessage::new(Speaker::User, "你好")).await;
    assert_eq!(log.last_text().await.as_deref(), Some("你好"));
}
