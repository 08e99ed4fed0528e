//! Conversational transcript: an ordered record of question/answer turns.
//!
//! The transcript is an explicit value owned by the caller (a chat
//! session), never process-global state, so independent sessions and
//! tests need no shared mutable variables. `append_turn` is pure and
//! returns a new transcript; a session reset is simply
//! [`Transcript::new`].
//!
//! Rendering produces the linear text block injected as prior context
//! into the query engine. An optional character budget bounds the
//! rendered form by dropping the oldest turns first; without a budget the
//! transcript grows monotonically for the life of the session.

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }
}

/// One transcript entry: either a user question or a model answer.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// Session lifecycle: `Empty` until the first turn, `Active` afterwards
/// until the caller resets by constructing a fresh transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptState {
    Empty,
    Active,
}

/// Ordered, append-only conversation history.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new transcript with `text` appended as the latest turn.
    pub fn append_turn(&self, speaker: Speaker, text: impl Into<String>) -> Transcript {
        let mut turns = self.turns.clone();
        turns.push(ConversationTurn {
            speaker,
            text: text.into(),
        });
        Transcript { turns }
    }

    pub fn state(&self) -> TranscriptState {
        if self.turns.is_empty() {
            TranscriptState::Empty
        } else {
            TranscriptState::Active
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the full history as `Speaker: text` lines, oldest first.
    ///
    /// Pure: rendering twice without intervening appends yields identical
    /// output.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.speaker.label(), turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render at most `max_chars` characters of history.
    ///
    /// Drops whole turns, oldest first, until the rendered form fits the
    /// budget; the most recent turn is always kept even if it alone
    /// exceeds the budget. `None` renders everything.
    pub fn render_bounded(&self, max_chars: Option<usize>) -> String {
        let budget = match max_chars {
            Some(b) => b,
            None => return self.render(),
        };

        let mut start = 0usize;
        while start + 1 < self.turns.len() {
            let rendered_len: usize = self.turns[start..]
                .iter()
                .map(|t| t.speaker.label().chars().count() + 2 + t.text.chars().count())
                .sum::<usize>()
                + (self.turns.len() - start).saturating_sub(1);
            if rendered_len <= budget {
                break;
            }
            start += 1;
        }

        self.turns[start..]
            .iter()
            .map(|turn| format!("{}: {}", turn.speaker.label(), turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
