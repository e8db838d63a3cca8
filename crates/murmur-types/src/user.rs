use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::author::AuthorStamp;
use crate::error::TypeError;
use crate::id::{ItemId, PostId, UserId};
use crate::post::Post;

/// An education entry on a profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationItem {
    pub id: ItemId,
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub start_year: String,
    #[serde(default)]
    pub end_year: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// A work-experience entry on a profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceItem {
    pub id: ItemId,
    pub company: String,
    pub title: String,
    /// Employment type, e.g. "Full-time".
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// A user account together with everything it owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// State or region of residence, asked for during onboarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Entrance exam the user is preparing for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance_exam: Option<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
    /// Most recent first.
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub education: Vec<EducationItem>,
    #[serde(default)]
    pub experience: Vec<ExperienceItem>,
    #[serde(default)]
    pub followers: BTreeSet<UserId>,
    #[serde(default)]
    pub following: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Trim and lowercase an email address, rejecting anything without a local
/// part and a domain.
pub fn normalize_email(email: &str) -> Result<String, TypeError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(TypeError::InvalidEmail(email)),
    }
}

impl User {
    /// Create a fresh account for `email`. The username defaults to the
    /// local part of the address.
    pub fn new(email: &str) -> Result<Self, TypeError> {
        let email = normalize_email(email)?;
        let username = email
            .split_once('@')
            .map(|(local, _)| local.to_string())
            .unwrap_or_default();
        Ok(Self {
            id: UserId::new(),
            email,
            username,
            avatar: None,
            bio: None,
            state: None,
            entrance_exam: None,
            onboarding_completed: false,
            posts: Vec::new(),
            education: Vec::new(),
            experience: Vec::new(),
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Author fields to denormalize onto a new post or comment.
    pub fn author_stamp(&self) -> AuthorStamp {
        AuthorStamp {
            id: self.id,
            name: self.username.clone(),
            username: self.username.clone(),
            avatar: self.avatar.clone(),
        }
    }

    pub fn post(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id() == *id)
    }

    pub fn post_mut(&mut self, id: &PostId) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id() == *id)
    }

    pub fn is_following(&self, other: &UserId) -> bool {
        self.following.contains(other)
    }

    /// Share of the headline profile fields that are filled in, as a
    /// rounded percentage. Username, avatar, bio, state and entrance exam
    /// count equally; blank values count as missing.
    pub fn completion_percentage(&self) -> u8 {
        let fields = [
            Some(self.username.as_str()),
            self.avatar.as_deref(),
            self.bio.as_deref(),
            self.state.as_deref(),
            self.entrance_exam.as_deref(),
        ];
        let filled = fields
            .iter()
            .filter(|f| f.is_some_and(|v| !v.trim().is_empty()))
            .count();
        (filled * 100 / fields.len()) as u8
    }
}

/// Partial profile edit. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: Option<String>,
    /// `Some(None)` clears the avatar. The same holds for `bio`, `state`
    /// and `entrance_exam`.
    #[serde(default)]
    pub avatar: Option<Option<String>>,
    #[serde(default)]
    pub bio: Option<Option<String>>,
    #[serde(default)]
    pub state: Option<Option<String>>,
    #[serde(default)]
    pub entrance_exam: Option<Option<String>>,
    #[serde(default)]
    pub onboarding_completed: Option<bool>,
    #[serde(default)]
    pub education: Option<Vec<EducationItem>>,
    #[serde(default)]
    pub experience: Option<Vec<ExperienceItem>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.avatar.is_none()
            && self.bio.is_none()
            && self.state.is_none()
            && self.entrance_exam.is_none()
            && self.onboarding_completed.is_none()
            && self.education.is_none()
            && self.experience.is_none()
    }

    /// Merge the present fields into `user`.
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(state) = self.state {
            user.state = state;
        }
        if let Some(exam) = self.entrance_exam {
            user.entrance_exam = exam;
        }
        if let Some(done) = self.onboarding_completed {
            user.onboarding_completed = done;
        }
        if let Some(education) = self.education {
            user.education = education;
        }
        if let Some(experience) = self.experience {
            user.experience = experience;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_derives_username() {
        let user = User::new("  Demo@Example.com ").unwrap();
        assert_eq!(user.email(), "demo@example.com");
        assert_eq!(user.username, "demo");
        assert!(user.posts.is_empty());
        assert!(user.followers.is_empty());
    }

    #[test]
    fn rejects_malformed_email() {
        for bad in ["", "nobody", "@example.com", "me@", "a@b@c"] {
            assert!(User::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn author_stamp_copies_profile() {
        let mut user = User::new("ada@example.com").unwrap();
        user.avatar = Some("a.png".into());
        let stamp = user.author_stamp();
        assert_eq!(stamp.id, user.id());
        assert_eq!(stamp.username, "ada");
        assert_eq!(stamp.avatar.as_deref(), Some("a.png"));
    }

    #[test]
    fn profile_update_merges_present_fields() {
        let mut user = User::new("ada@example.com").unwrap();
        user.avatar = Some("old.png".into());
        ProfileUpdate {
            username: Some("lovelace".into()),
            ..ProfileUpdate::default()
        }
        .apply(&mut user);
        assert_eq!(user.username, "lovelace");
        assert_eq!(user.avatar.as_deref(), Some("old.png"));

        ProfileUpdate {
            avatar: Some(None),
            ..ProfileUpdate::default()
        }
        .apply(&mut user);
        assert!(user.avatar.is_none());
    }

    #[test]
    fn profile_update_sets_onboarding_fields() {
        let mut user = User::new("ada@example.com").unwrap();
        let update = ProfileUpdate {
            bio: Some(Some("Analyst".into())),
            state: Some(Some("Kerala".into())),
            entrance_exam: Some(Some("JEE".into())),
            onboarding_completed: Some(true),
            ..ProfileUpdate::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut user);
        assert_eq!(user.bio.as_deref(), Some("Analyst"));
        assert_eq!(user.state.as_deref(), Some("Kerala"));
        assert_eq!(user.entrance_exam.as_deref(), Some("JEE"));
        assert!(user.onboarding_completed);

        ProfileUpdate {
            bio: Some(None),
            ..ProfileUpdate::default()
        }
        .apply(&mut user);
        assert!(user.bio.is_none());
        assert_eq!(user.state.as_deref(), Some("Kerala"));
    }

    #[test]
    fn completion_counts_filled_fields() {
        let mut user = User::new("ada@example.com").unwrap();
        assert_eq!(user.completion_percentage(), 20);

        user.bio = Some("   ".into());
        assert_eq!(user.completion_percentage(), 20);

        user.avatar = Some("a.png".into());
        user.bio = Some("Analyst".into());
        assert_eq!(user.completion_percentage(), 60);

        user.state = Some("Kerala".into());
        user.entrance_exam = Some("JEE".into());
        assert_eq!(user.completion_percentage(), 100);

        user.username.clear();
        assert_eq!(user.completion_percentage(), 80);
    }

    #[test]
    fn missing_onboarding_fields_default() {
        let mut json = serde_json::to_value(User::new("ada@example.com").unwrap()).unwrap();
        json.as_object_mut().unwrap().remove("onboarding_completed");
        let user: User = serde_json::from_value(json).unwrap();
        assert!(!user.onboarding_completed);
        assert!(user.bio.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let mut user = User::new("ada@example.com").unwrap();
        user.following.insert(UserId::new());
        user.state = Some("Kerala".into());
        user.onboarding_completed = true;
        user.education.push(EducationItem {
            id: ItemId::new(),
            institution: "IIT Bombay".into(),
            degree: "B.Tech".into(),
            field: "Computer Science".into(),
            start_year: "2020".into(),
            end_year: "2024".into(),
            skills: "Rust".into(),
            logo: None,
        });
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}
