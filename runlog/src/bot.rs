//! Chat bot that records runs into a [`RecordStore`].
//!
//! Every message goes through the same gate: only the configured user id may
//! read help, log a run or delete one. Anything that is not `/start` or
//! `/hapus` is read as a `distance, duration, pace, heart rate` submission.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::store::RecordStore;
use crate::{format_distance, parse_distance, WorkoutRecord, DATE_FORMAT};

/// Inbound chat message with the sender's numeric id.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: i64,
    pub text: String,
}

impl InboundMessage {
    pub fn new(sender_id: i64, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    DeleteLast,
    Submit(String),
}

impl Command {
    /// Route message text. A `@botname` suffix on a command is ignored.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let word = trimmed.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or(word);
        match name {
            "/start" => Command::Start,
            "/hapus" => Command::DeleteLast,
            _ => Command::Submit(trimmed.to_string()),
        }
    }
}

/// The four fields of a run submission, before the date is stamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub distance_km: f64,
    pub duration: String,
    pub pace: String,
    pub heart_rate: u32,
}

impl Submission {
    pub fn parse(text: &str) -> Result<Self, SubmissionError> {
        let parts: Vec<&str> = text.split(',').map(|p| p.trim()).collect();
        if parts.len() != 4 {
            return Err(SubmissionError::WrongFieldCount(parts.len()));
        }
        let distance_km = parse_distance(parts[0])
            .ok_or_else(|| SubmissionError::InvalidDistance(parts[0].to_string()))?;
        let heart_rate: u32 = parts[3]
            .parse()
            .map_err(|_| SubmissionError::InvalidHeartRate(parts[3].to_string()))?;
        Ok(Self {
            distance_km,
            duration: parts[1].to_string(),
            pace: parts[2].to_string(),
            heart_rate,
        })
    }

    pub fn into_record(self, date: NaiveDate) -> WorkoutRecord {
        WorkoutRecord {
            date,
            distance_km: self.distance_km,
            duration: self.duration,
            pace: self.pace,
            heart_rate: self.heart_rate,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("expected 4 comma-separated fields, found {0}")]
    WrongFieldCount(usize),
    #[error("invalid distance '{0}'")]
    InvalidDistance(String),
    #[error("invalid heart rate '{0}'")]
    InvalidHeartRate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Help,
    Denied,
    Saved(WorkoutRecord),
    Deleted { distance: String, date: String },
    NothingToDelete,
    FormatError,
    InvalidInput,
    StoreFailure(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Help => write!(
                f,
                "Welcome to the running log!\n\n\
                 Log a run as:\n`Distance, Time, Pace, HR`\n\n\
                 Example:\n`5.0, 25:30, 05:06, 165`\n\n\
                 Send /hapus to delete the last entry."
            ),
            Reply::Denied => write!(f, "Access denied. This bot is for personal use only."),
            Reply::Saved(record) => write!(
                f,
                "Run saved!\n\nDate: {}\nDistance: {} km\nTime: {}\nPace: {}\nHeart rate: {} bpm",
                record.date.format(DATE_FORMAT),
                format_distance(record.distance_km),
                record.duration,
                record.pace,
                record.heart_rate
            ),
            Reply::Deleted { distance, date } => write!(
                f,
                "Entry deleted: {} km run on {} has been removed.",
                distance, date
            ),
            Reply::NothingToDelete => write!(f, "Nothing to delete."),
            Reply::FormatError => write!(f, "Wrong format! Use: `Distance, Time, Pace, HR`"),
            Reply::InvalidInput => write!(
                f,
                "Invalid input! Distance and HR must be numbers."
            ),
            Reply::StoreFailure(message) => write!(f, "Something went wrong: {}", message),
        }
    }
}

/// Bot bound to one authorized user and one store.
pub struct Bot<S> {
    store: S,
    authorized_user_id: i64,
}

impl<S: RecordStore> Bot<S> {
    pub fn new(store: S, authorized_user_id: i64) -> Self {
        Self {
            store,
            authorized_user_id,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn is_authorized(&self, sender_id: i64) -> bool {
        sender_id == self.authorized_user_id
    }

    /// Handle one message. `today` stamps accepted submissions.
    pub fn handle(&mut self, message: &InboundMessage, today: NaiveDate) -> Reply {
        if !self.is_authorized(message.sender_id) {
            warn!(sender = message.sender_id, "Rejected message from unauthorized sender");
            return Reply::Denied;
        }
        match Command::parse(&message.text) {
            Command::Start => Reply::Help,
            Command::DeleteLast => self.delete_last(),
            Command::Submit(text) => self.submit(&text, today),
        }
    }

    fn submit(&mut self, text: &str, today: NaiveDate) -> Reply {
        let submission = match Submission::parse(text) {
            Ok(submission) => submission,
            Err(SubmissionError::WrongFieldCount(count)) => {
                info!(fields = count, "Submission has wrong field count");
                return Reply::FormatError;
            }
            Err(err) => {
                info!("Submission failed to parse: {}", err);
                return Reply::InvalidInput;
            }
        };

        let record = submission.into_record(today);
        match self.store.append_row(&record.to_row()) {
            Ok(()) => {
                info!(
                    "Saved run: {} km on {}",
                    format_distance(record.distance_km),
                    record.date
                );
                Reply::Saved(record)
            }
            Err(err) => {
                warn!("Append failed: {}", err);
                Reply::StoreFailure(err.to_string())
            }
        }
    }

    fn delete_last(&mut self) -> Reply {
        let result = self.store.rows().and_then(|rows| {
            if rows.len() <= 1 {
                return Ok(None);
            }
            let last = rows.last().cloned().unwrap_or_default();
            self.store.delete_last_row()?;
            Ok(Some(last))
        });
        match result {
            Ok(Some(last)) => {
                let cell = |idx: usize| last.get(idx).cloned().unwrap_or_default();
                info!("Deleted last run dated {}", cell(0));
                Reply::Deleted {
                    distance: cell(1),
                    date: cell(0),
                }
            }
            Ok(None) => Reply::NothingToDelete,
            Err(err) => {
                warn!("Delete failed: {}", err);
                Reply::StoreFailure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::header_row;

    const OWNER: i64 = 424242;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn authorized_submission_appends_normalized_row() {
        let mut bot = Bot::new(MemoryStore::new(), OWNER);
        let reply = bot.handle(&InboundMessage::new(OWNER, "5.0, 25:30, 05:06, 165"), today());
        assert!(matches!(reply, Reply::Saved(_)));
        assert_eq!(
            bot.store().rows().unwrap(),
            vec![
                header_row(),
                row(&["2026-10-19", "5.0", "25:30", "05:06", "165"])
            ]
        );
    }

    #[test]
    fn other_sender_is_denied_without_side_effects() {
        let mut bot = Bot::new(MemoryStore::new(), OWNER);
        for text in ["5.0, 25:30, 05:06, 165", "/hapus", "/start"] {
            let reply = bot.handle(&InboundMessage::new(OWNER + 1, text), today());
            assert_eq!(reply, Reply::Denied);
        }
        assert_eq!(bot.store().record_count().unwrap(), 0);
    }

    #[test]
    fn wrong_field_count_is_a_format_error() {
        let mut bot = Bot::new(MemoryStore::new(), OWNER);
        for text in ["5.0, 25:30, 05:06", "5,0, 25:30, 05:06, 165", "hello"] {
            let reply = bot.handle(&InboundMessage::new(OWNER, text), today());
            assert_eq!(reply, Reply::FormatError, "{:?}", text);
        }
        assert_eq!(bot.store().record_count().unwrap(), 0);
    }

    #[test]
    fn non_numeric_fields_are_invalid_input() {
        let mut bot = Bot::new(MemoryStore::new(), OWNER);
        for text in ["five, 25:30, 05:06, 165", "5.0, 25:30, 05:06, 16x", "-2, 10:00, 5:00, 150"] {
            let reply = bot.handle(&InboundMessage::new(OWNER, text), today());
            assert_eq!(reply, Reply::InvalidInput, "{:?}", text);
        }
        assert_eq!(bot.store().record_count().unwrap(), 0);
    }

    #[test]
    fn delete_on_empty_store_reports_nothing() {
        let mut bot = Bot::new(MemoryStore::new(), OWNER);
        let reply = bot.handle(&InboundMessage::new(OWNER, "/hapus"), today());
        assert_eq!(reply, Reply::NothingToDelete);
        assert_eq!(bot.store().rows().unwrap(), vec![header_row()]);
    }

    #[test]
    fn append_then_delete_restores_count() {
        let store = MemoryStore::with_rows(vec![row(&["2026-10-01", "3.0", "18:00", "6:00", "150"])]);
        let mut bot = Bot::new(store, OWNER);
        let before = bot.store().record_count().unwrap();

        bot.handle(&InboundMessage::new(OWNER, "10, 52:00, 5'12, 171"), today());
        let reply = bot.handle(&InboundMessage::new(OWNER, "/hapus"), today());

        assert_eq!(
            reply,
            Reply::Deleted {
                distance: "10.0".into(),
                date: "2026-10-19".into()
            }
        );
        assert_eq!(bot.store().record_count().unwrap(), before);
    }

    #[test]
    fn store_failure_is_reported_not_raised() {
        let mut store = MemoryStore::new();
        store.fail_with("sheet unavailable");
        let mut bot = Bot::new(store, OWNER);
        let reply = bot.handle(&InboundMessage::new(OWNER, "5.0, 25:30, 05:06, 165"), today());
        assert!(matches!(reply, Reply::StoreFailure(ref m) if m.contains("sheet unavailable")));
        let reply = bot.handle(&InboundMessage::new(OWNER, "/hapus"), today());
        assert!(matches!(reply, Reply::StoreFailure(_)));
    }

    #[test]
    fn submission_errors_describe_the_field() {
        let err = Submission::parse("5.0, 25:30, 05:06, 16x").unwrap_err();
        assert_eq!(err, SubmissionError::InvalidHeartRate("16x".into()));
        assert_eq!(err.to_string(), "invalid heart rate '16x'");
        let err = Submission::parse("5.0, 25:30").unwrap_err();
        assert_eq!(err.to_string(), "expected 4 comma-separated fields, found 2");
    }

    #[test]
    fn commands_ignore_bot_suffix() {
        assert_eq!(Command::parse(" /start@runlog_bot "), Command::Start);
        assert_eq!(Command::parse("/hapus"), Command::DeleteLast);
        assert_eq!(
            Command::parse("/stats"),
            Command::Submit("/stats".to_string())
        );
    }
}
