//! Writing coach: a chat about the writing prompt that can also write
//! into the student's draft.

use crate::llm::ReadingAssistant;
use crate::session::{ChatMessage, GeneratedExercise};

/// Hidden opening query; the coach greets the student without it showing
/// up in the history.
const START_QUERY: &str = "[SYSTEM_START]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    /// No idea where to begin.
    Start,
    /// Review the current draft.
    Review,
    /// Suggest words and idioms.
    Vocab,
}

impl QuickAction {
    pub fn query(&self) -> &'static str {
        match self {
            QuickAction::Start => "我还没有思路，我不确定怎么开始。",
            QuickAction::Review => "请帮我点评一下我现在写的内容，有哪些地方可以优化？",
            QuickAction::Vocab => "针对这个题目，有哪些好词好句或者成语推荐我使用吗？",
        }
    }
}

pub struct WritingCoach {
    prompt: String,
    tips: Vec<String>,
    article_context: String,
    history: Vec<ChatMessage>,
    draft: String,
    typing: bool,
}

impl WritingCoach {
    pub fn new(prompt: &str, tips: Vec<String>, article_context: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            tips,
            article_context: article_context.to_string(),
            history: Vec::new(),
            draft: String::new(),
            typing: false,
        }
    }

    pub fn from_exercise(exercise: &GeneratedExercise, article_context: &str) -> Self {
        Self::new(
            &exercise.writing_prompt,
            exercise.writing_tips.clone(),
            article_context,
        )
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn tips(&self) -> &[String] {
        &self.tips
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// A reply is being awaited.
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Fetch the coach's opening message.
    pub async fn start(&mut self, assistant: &ReadingAssistant) {
        self.exchange(assistant, START_QUERY, true).await;
    }

    /// Send a student message and append the reply.  Blank queries are
    /// ignored.
    pub async fn send(&mut self, assistant: &ReadingAssistant, query: &str) {
        self.exchange(assistant, query, false).await;
    }

    pub async fn quick_action(&mut self, assistant: &ReadingAssistant, action: QuickAction) {
        self.send(assistant, action.query()).await;
    }

    async fn exchange(&mut self, assistant: &ReadingAssistant, query: &str, hidden: bool) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let prior = self.history.clone();
        if !hidden {
            self.history.push(ChatMessage::user(query));
        }

        self.typing = true;
        let reply = assistant
            .writing_guidance(
                &self.prompt,
                &self.draft,
                query,
                &prior,
                &self.article_context,
            )
            .await;
        self.typing = false;

        self.history.push(ChatMessage::ai(reply.reply));
        if let Some(content) = reply.draft_content {
            self.append_draft(&content);
        }
    }

    fn append_draft(&mut self, content: &str) {
        if !self.draft.is_empty() && !self.draft.ends_with('\n') {
            self.draft.push('\n');
        }
        self.draft.push_str(content);
        log::debug!("coach: appended {} chars to draft", content.chars().count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{assistant, failing_assistant, MockGenerator};
    use crate::llm::GUIDANCE_RETRY_REPLY;
    use crate::session::ChatRole;

    fn coach() -> WritingCoach {
        WritingCoach::new("写一篇游记", vec!["注意顺序".into()], "曲曲折折的荷塘上面")
    }

    #[tokio::test]
    async fn start_is_hidden() {
        let mut c = coach();
        c.start(&assistant(MockGenerator::fixed(r#"{"reply":"你好！"}"#)))
            .await;
        assert_eq!(c.history(), &[ChatMessage::ai("你好！")]);
    }

    #[tokio::test]
    async fn send_records_both_turns() {
        let generator = MockGenerator::fixed(r#"{"reply":"试试从景物写起"}"#);
        let last = generator.last_prompt();
        let mut c = coach();
        c.quick_action(&assistant(generator), QuickAction::Start).await;

        assert_eq!(c.history().len(), 2);
        assert_eq!(c.history()[0].role, ChatRole::User);
        assert_eq!(c.history()[1].text, "试试从景物写起");
        let prompt = last.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("History: []"));
        assert!(prompt.contains(QuickAction::Start.query()));
        assert!(!c.is_typing());
    }

    #[tokio::test]
    async fn draft_content_is_appended_on_new_line() {
        let a = assistant(MockGenerator::fixed(
            r#"{"reply":"帮你写了一句","draftContent":"月光如流水。"}"#,
        ));
        let mut c = coach();
        c.set_draft("荷塘很静。");
        c.send(&a, "帮我写一句").await;
        assert_eq!(c.draft(), "荷塘很静。\n月光如流水。");

        c.set_draft("");
        c.send(&a, "再来一句").await;
        assert_eq!(c.draft(), "月光如流水。");
    }

    #[tokio::test]
    async fn blank_query_is_ignored() {
        let generator = MockGenerator::fixed(r#"{"reply":"x"}"#);
        let calls = generator.calls();
        let mut c = coach();
        c.send(&assistant(generator), "   ").await;
        assert!(c.history().is_empty());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_replies_with_retry_message() {
        let mut c = coach();
        c.send(&failing_assistant(), "你好").await;
        assert_eq!(c.history()[1].text, GUIDANCE_RETRY_REPLY);
        assert_eq!(c.draft(), "");
    }
}
