use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{BadgeError, BadgeResult};

/// One attendee as supplied by the roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    /// Unique identifier; also the verification payload suffix.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Delivery address.
    #[serde(default)]
    pub email: String,
    /// Optional job title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    /// Optional organization name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Attendee {
    /// `first last`, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_owned()
    }

    /// Download file name: `badge-{firstName}-{lastName}.png`.
    ///
    /// Path separators are replaced so the name can never escape the target directory.
    pub fn badge_file_name(&self) -> String {
        fn clean(s: &str) -> String {
            s.trim()
                .chars()
                .map(|c| match c {
                    '/' | '\\' | ':' | '\0' => '_',
                    c => c,
                })
                .collect()
        }
        format!(
            "badge-{}-{}.png",
            clean(&self.first_name),
            clean(&self.last_name)
        )
    }
}

/// Event the badges are issued for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Identifier used to scope the dispatch endpoint.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Image references; the first one is the event mark.
    #[serde(default)]
    pub images: Vec<String>,
}

impl Event {
    /// Reference of the event mark, if any.
    pub fn logo(&self) -> Option<&str> {
        self.images
            .first()
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

/// Organizer issuing the badges.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    /// Avatar/logo reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Organization display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Issuer {
    /// Reference of the issuer mark, if any.
    pub fn logo(&self) -> Option<&str> {
        self.avatar.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Input document for the command-line tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    /// The event.
    pub event: Event,
    /// The issuer; defaults to one without avatar.
    #[serde(default)]
    pub issuer: Issuer,
    /// Attendees in submission order.
    pub attendees: Vec<Attendee>,
}

impl Roster {
    /// Reject empty ids and duplicate ids.
    pub fn validate(&self) -> BadgeResult<()> {
        validate_attendees(&self.attendees)
    }

    /// Look up an attendee by id.
    pub fn attendee(&self, id: &str) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.id == id)
    }
}

pub(crate) fn validate_attendees(attendees: &[Attendee]) -> BadgeResult<()> {
    let mut seen = BTreeSet::new();
    for a in attendees {
        if a.id.trim().is_empty() {
            return Err(BadgeError::validation("attendee id must be non-empty"));
        }
        if !seen.insert(a.id.as_str()) {
            return Err(BadgeError::validation(format!(
                "duplicate attendee id '{}'",
                a.id
            )));
        }
    }
    Ok(())
}
