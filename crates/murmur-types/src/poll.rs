use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{PollOptionId, UserId};

/// One choice in a poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: PollOptionId,
    pub text: String,
    #[serde(default)]
    pub votes: u64,
}

/// A poll embedded in a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub question: String,
    pub options: Vec<PollOption>,
    #[serde(default)]
    voted_by: BTreeSet<UserId>,
}

/// Poll as submitted with a new post.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<String>,
}

impl Poll {
    /// Build a poll from a question and at least two non-blank options.
    pub fn new(draft: NewPoll) -> Result<Self, TypeError> {
        let question = draft.question.trim();
        if question.is_empty() {
            return Err(TypeError::InvalidPoll("question is empty".into()));
        }
        let options: Vec<PollOption> = draft
            .options
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .enumerate()
            .map(|(i, text)| PollOption {
                id: PollOptionId(i as u32 + 1),
                text: text.to_string(),
                votes: 0,
            })
            .collect();
        if options.len() < 2 {
            return Err(TypeError::InvalidPoll(format!(
                "needs at least 2 options, got {}",
                options.len()
            )));
        }
        Ok(Self {
            question: question.to_string(),
            options,
            voted_by: BTreeSet::new(),
        })
    }

    /// Cast `voter`'s single vote for `option`. Returns the option's new tally.
    pub fn vote(&mut self, voter: UserId, option: PollOptionId) -> Result<u64, TypeError> {
        if self.voted_by.contains(&voter) {
            return Err(TypeError::AlreadyVoted);
        }
        let choice = self
            .options
            .iter_mut()
            .find(|o| o.id == option)
            .ok_or(TypeError::UnknownPollOption(option))?;
        choice.votes += 1;
        self.voted_by.insert(voter);
        Ok(choice.votes)
    }

    pub fn has_voted(&self, voter: &UserId) -> bool {
        self.voted_by.contains(voter)
    }

    pub fn voters(&self) -> &BTreeSet<UserId> {
        &self.voted_by
    }

    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(options: &[&str]) -> NewPoll {
        NewPoll {
            question: "Tabs or spaces?".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn options_are_numbered_from_one() {
        let poll = Poll::new(draft(&["tabs", " ", "spaces"])).unwrap();
        let ids: Vec<u32> = poll.options.iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(poll.options[1].text, "spaces");
    }

    #[test]
    fn needs_two_options() {
        let err = Poll::new(draft(&["only"])).unwrap_err();
        assert!(matches!(err, TypeError::InvalidPoll(_)));
    }

    #[test]
    fn needs_question() {
        let mut d = draft(&["a", "b"]);
        d.question = "   ".into();
        assert!(Poll::new(d).is_err());
    }

    #[test]
    fn one_vote_per_user() {
        let mut poll = Poll::new(draft(&["a", "b"])).unwrap();
        let voter = UserId::new();
        assert_eq!(poll.vote(voter, PollOptionId(2)).unwrap(), 1);
        assert_eq!(poll.vote(voter, PollOptionId(1)), Err(TypeError::AlreadyVoted));
        assert!(poll.has_voted(&voter));
        assert_eq!(poll.total_votes(), 1);
    }

    #[test]
    fn unknown_option_leaves_poll_untouched() {
        let mut poll = Poll::new(draft(&["a", "b"])).unwrap();
        let voter = UserId::new();
        assert_eq!(
            poll.vote(voter, PollOptionId(9)),
            Err(TypeError::UnknownPollOption(PollOptionId(9)))
        );
        assert!(!poll.has_voted(&voter));
        assert_eq!(poll.total_votes(), 0);
    }
}
