use murmur_store::Repository;
use murmur_types::{EducationItem, ExperienceItem, ItemId, User};

use crate::error::{GraphError, GraphResult};
use crate::graph::SocialGraph;

/// Replace the entry with the same id, or append.
fn upsert_by_id<T>(items: &mut Vec<T>, item: T, id_of: impl Fn(&T) -> ItemId) {
    let id = id_of(&item);
    match items.iter_mut().find(|existing| id_of(existing) == id) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl<R: Repository> SocialGraph<R> {
    /// Add an education entry to the signed-in user's profile, or replace
    /// the entry with the same id.
    pub fn upsert_education(&self, item: EducationItem) -> GraphResult<User> {
        if item.institution.trim().is_empty() {
            return Err(GraphError::InvalidInput("institution is empty".into()));
        }
        let mut user = self.active_user()?;
        upsert_by_id(&mut user.education, item, |e| e.id);
        self.repo.upsert(&user)?;
        Ok(user)
    }

    /// Remove an education entry. Returns `false` if there was none.
    pub fn remove_education(&self, id: &ItemId) -> GraphResult<bool> {
        let mut user = self.active_user()?;
        let before = user.education.len();
        user.education.retain(|e| e.id != *id);
        if user.education.len() == before {
            return Ok(false);
        }
        self.repo.upsert(&user)?;
        Ok(true)
    }

    /// Add an experience entry to the signed-in user's profile, or replace
    /// the entry with the same id.
    pub fn upsert_experience(&self, item: ExperienceItem) -> GraphResult<User> {
        if item.company.trim().is_empty() || item.title.trim().is_empty() {
            return Err(GraphError::InvalidInput(
                "company and title are required".into(),
            ));
        }
        let mut user = self.active_user()?;
        upsert_by_id(&mut user.experience, item, |e| e.id);
        self.repo.upsert(&user)?;
        Ok(user)
    }

    /// Remove an experience entry. Returns `false` if there was none.
    pub fn remove_experience(&self, id: &ItemId) -> GraphResult<bool> {
        let mut user = self.active_user()?;
        let before = user.experience.len();
        user.experience.retain(|e| e.id != *id);
        if user.experience.len() == before {
            return Ok(false);
        }
        self.repo.upsert(&user)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::graph;

    fn education(institution: &str) -> EducationItem {
        EducationItem {
            id: ItemId::new(),
            institution: institution.into(),
            degree: "B.Tech".into(),
            field: "Computer Science".into(),
            start_year: "2020".into(),
            end_year: "2024".into(),
            skills: "Rust".into(),
            logo: None,
        }
    }

    fn experience(company: &str) -> ExperienceItem {
        ExperienceItem {
            id: ItemId::new(),
            company: company.into(),
            title: "Software Engineer".into(),
            kind: "Full-time".into(),
            location: "Bangalore".into(),
            start_date: "2024".into(),
            end_date: "Present".into(),
            description: String::new(),
            skills: String::new(),
            logo: None,
        }
    }

    #[test]
    fn education_entries_edit_independently() {
        let g = graph();
        g.login("ada@example.com").unwrap();
        let first = education("IIT Bombay");
        let second = education("MIT");
        g.upsert_education(first.clone()).unwrap();
        g.upsert_education(second.clone()).unwrap();

        let mut edited = first.clone();
        edited.end_year = "2025".into();
        let user = g.upsert_education(edited).unwrap();
        assert_eq!(user.education.len(), 2);
        assert_eq!(user.education[0].end_year, "2025");
        assert_eq!(user.education[1], second);

        assert!(g.remove_education(&first.id).unwrap());
        assert!(!g.remove_education(&first.id).unwrap());
        let current = g.current_user().unwrap().unwrap();
        assert_eq!(current.education, vec![second]);
    }

    #[test]
    fn experience_entries_edit_independently() {
        let g = graph();
        g.login("ada@example.com").unwrap();
        let job = experience("Tech Corp");
        g.upsert_experience(job.clone()).unwrap();
        assert_eq!(g.current_user().unwrap().unwrap().experience, vec![job.clone()]);
        assert!(g.remove_experience(&job.id).unwrap());
        assert!(g.current_user().unwrap().unwrap().experience.is_empty());
    }

    #[test]
    fn entries_are_validated() {
        let g = graph();
        g.login("ada@example.com").unwrap();
        assert!(matches!(
            g.upsert_education(education(" ")),
            Err(GraphError::InvalidInput(_))
        ));
        assert!(matches!(
            g.upsert_experience(experience("")),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn entries_require_session() {
        let g = graph();
        assert!(matches!(
            g.upsert_education(education("MIT")),
            Err(GraphError::Unauthenticated)
        ));
        assert!(matches!(
            g.remove_experience(&ItemId::new()),
            Err(GraphError::Unauthenticated)
        ));
    }
}
