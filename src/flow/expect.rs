//! Reply expectations and the validators built from them

use super::step::Validator;
use crate::activity::Activity;
use crate::error::HarnessError;
use std::sync::Arc;

/// What an assertion expects the next reply to be
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedReply {
    /// A message with exactly this text
    Text(String),
    /// Same type; for messages, also the same text
    Activity(Activity),
}

impl From<&str> for ExpectedReply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ExpectedReply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Activity> for ExpectedReply {
    fn from(activity: Activity) -> Self {
        Self::Activity(activity)
    }
}

impl ExpectedReply {
    /// Fallback description when the caller gave none
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Text(text) => format!("reply {text:?}"),
            Self::Activity(activity) => match activity.text() {
                Some(text) if activity.is_message() => format!("reply {text:?}"),
                _ => format!("{} reply", activity.activity_type),
            },
        }
    }
}

pub(crate) fn matches_activity(expected: Activity, description: String) -> Validator {
    Arc::new(move |reply: &Activity| {
        if expected.activity_type != reply.activity_type {
            return Err(HarnessError::assertion(format!(
                "{description}: Type should match (expected {}, got {})",
                expected.activity_type, reply.activity_type
            )));
        }
        if expected.is_message() && expected.text != reply.text {
            return Err(HarnessError::assertion(format!(
                "{description}: Text should match (expected {:?}, got {:?})",
                expected.text(),
                reply.text()
            )));
        }
        Ok(())
    })
}

pub(crate) fn one_of(candidates: Vec<String>, description: Option<String>) -> Validator {
    Arc::new(move |reply: &Activity| {
        // A reply without text matches nothing, not even an empty candidate
        let text = reply.text();
        if candidates.iter().any(|c| text == Some(c.as_str())) {
            return Ok(());
        }
        let listed = candidates.join("\n");
        let got = text.map_or_else(
            || format!("{} reply without text", reply.activity_type),
            |t| format!("{t:?}"),
        );
        Err(HarnessError::assertion(match &description {
            Some(d) => format!("{d}: {got} is not one of candidates:\n{listed}"),
            None => format!("{got} is not one of candidates:\n{listed}"),
        }))
    })
}
