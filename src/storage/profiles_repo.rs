// Profiles repository for rapport
// Whole-document CRUD for profile records

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseManager;
use crate::profile::{Profile, ProfileSummary};

impl DatabaseManager {
    /// Save a profile, replacing the whole stored document.
    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.with_connection(|conn| save_profile_impl(conn, profile))
    }

    /// Load a profile by id, or None when it does not exist.
    pub fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        self.with_connection(|conn| get_profile_impl(conn, profile_id))
    }

    /// List summaries of all stored profiles, newest first.
    pub fn list_profiles(&self) -> Result<Vec<ProfileSummary>> {
        self.with_connection(list_profiles_impl)
    }

    /// Delete a profile and the media files its meetings reference.
    pub fn delete_profile(&self, profile_id: &str) -> Result<()> {
        let profile = self.get_profile(profile_id)?;

        if let Some(profile) = profile {
            for meeting in &profile.meetings {
                if meeting.media_path.exists() {
                    if let Err(e) = std::fs::remove_file(&meeting.media_path) {
                        warn!(
                            "Failed to remove meeting media {}: {}",
                            meeting.media_path.display(),
                            e
                        );
                    }
                }
            }
        }

        self.with_connection(|conn| {
            conn.execute("DELETE FROM profiles WHERE id = ?1", params![profile_id])
                .context("Failed to delete profile")?;
            Ok(())
        })
    }
}

fn save_profile_impl(conn: &Connection, profile: &Profile) -> Result<()> {
    let document =
        serde_json::to_string(profile).context("Failed to serialize profile document")?;

    conn.execute(
        r#"
        INSERT INTO profiles (id, full_name, created_at, meeting_count, document)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            full_name = excluded.full_name,
            created_at = excluded.created_at,
            meeting_count = excluded.meeting_count,
            document = excluded.document
        "#,
        params![
            profile.id,
            profile.full_name,
            profile.created_at.to_rfc3339(),
            profile.meetings.len() as i64,
            document,
        ],
    )
    .context("Failed to save profile")?;

    Ok(())
}

fn get_profile_impl(conn: &Connection, profile_id: &str) -> Result<Option<Profile>> {
    let document: Option<String> = conn
        .query_row(
            "SELECT document FROM profiles WHERE id = ?1",
            params![profile_id],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to query profile")?;

    match document {
        Some(document) => {
            let profile = serde_json::from_str(&document)
                .context("Failed to deserialize profile document")?;
            Ok(Some(profile))
        }
        None => Ok(None),
    }
}

fn list_profiles_impl(conn: &Connection) -> Result<Vec<ProfileSummary>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, full_name, created_at, meeting_count FROM profiles \
             ORDER BY created_at DESC",
        )
        .context("Failed to prepare profile listing")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .context("Failed to list profiles")?;

    let mut summaries = Vec::new();
    for row in rows {
        let (id, full_name, created_at, meeting_count) = row?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default();
        summaries.push(ProfileSummary {
            id,
            full_name,
            created_at,
            meeting_count: meeting_count as usize,
        });
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ParticipationSummary;
    use crate::insight::MeetingInsights;
    use crate::profile::{Meeting, PersonaProfile};
    use tempfile::tempdir;

    fn manager() -> (tempfile::TempDir, DatabaseManager) {
        let dir = tempdir().unwrap();
        let manager = DatabaseManager::new(dir.path().join("test.db")).unwrap();
        (dir, manager)
    }

    #[test]
    fn test_profile_round_trip() {
        let (_dir, db) = manager();

        let profile = Profile::new("Ada Example", PersonaProfile::default());
        db.save_profile(&profile).unwrap();

        let loaded = db.get_profile(&profile.id).unwrap().unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_get_missing_profile_is_none() {
        let (_dir, db) = manager();
        assert!(db.get_profile("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_whole_document() {
        let (_dir, db) = manager();

        let mut profile = Profile::new("Ada Example", PersonaProfile::default());
        db.save_profile(&profile).unwrap();

        profile.meetings.push(Meeting::new(
            "/tmp/nonexistent-meeting.mp4".into(),
            Vec::new(),
            ParticipationSummary::default(),
            MeetingInsights::default(),
        ));
        db.save_profile(&profile).unwrap();

        let loaded = db.get_profile(&profile.id).unwrap().unwrap();
        assert_eq!(loaded.meetings.len(), 1);

        let summaries = db.list_profiles().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].meeting_count, 1);
    }

    #[test]
    fn test_delete_cascades_to_media_files() {
        let (dir, db) = manager();

        let media_path = dir.path().join("meeting.mp4");
        std::fs::write(&media_path, b"fake media").unwrap();

        let mut profile = Profile::new("Ada Example", PersonaProfile::default());
        profile.meetings.push(Meeting::new(
            media_path.clone(),
            Vec::new(),
            ParticipationSummary::default(),
            MeetingInsights::default(),
        ));
        db.save_profile(&profile).unwrap();

        db.delete_profile(&profile.id).unwrap();
        assert!(db.get_profile(&profile.id).unwrap().is_none());
        assert!(!media_path.exists());
    }

    #[test]
    fn test_delete_missing_profile_is_ok() {
        let (_dir, db) = manager();
        db.delete_profile("no-such-id").unwrap();
    }
}
