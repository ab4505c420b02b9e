//! Conversation → episode transformation.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::errors::EpisodeError;
use crate::nodes::episodic::EpisodeType;
use crate::utils::datetime::parse_conversation_time;

use super::{Conversation, ConversationSummary, Episode, EPISODE_DESCRIPTION};

/// Episodes built from one summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltEpisodes {
    /// One episode per conversation, bucket-major.
    pub episodes: Vec<Episode>,
    /// How many episodes got the wall-clock time because their timestamp was
    /// missing or unparseable.
    pub recovered_timestamps: usize,
}

/// Builds [`Episode`]s from a [`ConversationSummary`].
///
/// In the default (lenient) mode a conversation without a usable timestamp
/// is stamped with the current time; in strict mode it is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpisodeBuilder {
    strict: bool,
}

impl EpisodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject conversations without a usable timestamp instead of stamping them with "now".
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Build every episode, preserving bucket then conversation order.
    pub fn build(&self, summary: &ConversationSummary) -> Result<BuiltEpisodes, EpisodeError> {
        let mut built = BuiltEpisodes {
            episodes: Vec::with_capacity(summary.conversation_count()),
            recovered_timestamps: 0,
        };

        for (bucket, conversations) in summary.buckets() {
            for conversation in conversations {
                let (episode, recovered) = self.episode_for(conversation)?;
                if recovered {
                    debug!(
                        bucket,
                        title = %conversation.title,
                        timestamp = ?conversation.timestamp(),
                        "no usable timestamp, using current time"
                    );
                    built.recovered_timestamps += 1;
                }
                built.episodes.push(episode);
            }
        }

        if built.recovered_timestamps > 0 {
            warn!(
                recovered = built.recovered_timestamps,
                total = built.episodes.len(),
                "episodes stamped with current time for lack of a parseable timestamp"
            );
        }

        Ok(built)
    }

    /// Build the episode for a single conversation.
    pub fn build_episode(&self, conversation: &Conversation) -> Result<Episode, EpisodeError> {
        self.episode_for(conversation).map(|(episode, _)| episode)
    }

    fn episode_for(&self, conversation: &Conversation) -> Result<(Episode, bool), EpisodeError> {
        let (reference_time, recovered) = self.reference_time(conversation)?;

        let episode = Episode {
            name: episode_name(&conversation.title),
            body: episode_body(conversation),
            kind: EpisodeType::Message,
            description: EPISODE_DESCRIPTION.to_string(),
            reference_time,
        };
        Ok((episode, recovered))
    }

    fn reference_time(
        &self,
        conversation: &Conversation,
    ) -> Result<(DateTime<Utc>, bool), EpisodeError> {
        let raw = conversation.timestamp();
        match raw.and_then(parse_conversation_time) {
            Some(time) => Ok((time, false)),
            None if self.strict => Err(EpisodeError::Timestamp {
                title: conversation.title.clone(),
                value: raw.map(str::to_owned),
            }),
            None => Ok((Utc::now(), true)),
        }
    }
}

/// Title with every space replaced by an underscore.
pub fn episode_name(title: &str) -> String {
    title.replace(' ', "_")
}

/// `"<author>: <text>"` per message, one per line, trimmed.
pub fn episode_body(conversation: &Conversation) -> String {
    let mut body = String::new();
    for message in conversation.messages() {
        body.push_str(&message.author);
        body.push_str(": ");
        body.push_str(&message.text);
        body.push('\n');
    }
    body.trim().to_string()
}
