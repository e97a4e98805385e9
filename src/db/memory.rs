//! In-process backend used when no database is configured, and by tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Admin, BlogPost, ClientProject, Document, GalleryItem, Project, SlotId, Testimonial,
    VideoSlot, VideoSlotUpdate,
};
use super::store::{Admins, Collection, StoreError, VideoSlots};

/// One table of documents kept in insertion order.
pub struct MemoryCollection<T> {
    docs: RwLock<Vec<T>>,
}

impl<T> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<T: Document> Collection<T> for MemoryCollection<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let mut docs = self.docs.read().await.clone();
        // Stable sort over insertion order keeps same-instant inserts newest first.
        docs.reverse();
        docs.sort_by_key(|d| std::cmp::Reverse(d.created_at()));
        Ok(docs)
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| d.id() == id).cloned())
    }

    async fn insert(&self, doc: T) -> Result<T, StoreError> {
        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.id() == doc.id()) {
            return Err(StoreError::Conflict(format!(
                "{} {} already exists",
                T::ENTITY,
                doc.id()
            )));
        }
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn save(&self, mut doc: T) -> Result<Option<T>, StoreError> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.id() == doc.id()) {
            Some(slot) => {
                doc.touch(Utc::now());
                *slot = doc.clone();
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        let mut docs = self.docs.write().await;
        match docs.iter().position(|d| d.id() == id) {
            Some(index) => Ok(Some(docs.remove(index))),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct MemoryVideoSlots {
    slots: RwLock<BTreeMap<SlotId, VideoSlot>>,
}

#[async_trait]
impl VideoSlots for MemoryVideoSlots {
    async fn list(&self) -> Result<Vec<VideoSlot>, StoreError> {
        Ok(self.slots.read().await.values().cloned().collect())
    }

    async fn get(&self, slot: SlotId) -> Result<Option<VideoSlot>, StoreError> {
        Ok(self.slots.read().await.get(&slot).cloned())
    }

    async fn upsert(
        &self,
        slot: SlotId,
        update: VideoSlotUpdate,
    ) -> Result<VideoSlot, StoreError> {
        let now = Utc::now();
        let mut slots = self.slots.write().await;
        let record = slots
            .entry(slot)
            .or_insert_with(|| VideoSlot::empty(slot, now));
        update.apply(record);
        record.updated_at = now;
        Ok(record.clone())
    }
}

#[derive(Default)]
pub struct MemoryAdmins {
    admins: RwLock<Vec<Admin>>,
}

#[async_trait]
impl Admins for MemoryAdmins {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        let admins = self.admins.read().await;
        Ok(admins.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let admins = self.admins.read().await;
        Ok(admins
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, admin: Admin) -> Result<Admin, StoreError> {
        let mut admins = self.admins.write().await;
        if admins.iter().any(|a| a.email.eq_ignore_ascii_case(&admin.email)) {
            return Err(StoreError::Conflict(format!(
                "admin {} already exists",
                admin.email
            )));
        }
        admins.push(admin.clone());
        Ok(admin)
    }
}

/// Every collection held in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub gallery: MemoryCollection<GalleryItem>,
    pub blog: MemoryCollection<BlogPost>,
    pub client_projects: MemoryCollection<ClientProject>,
    pub testimonials: MemoryCollection<Testimonial>,
    pub projects: MemoryCollection<Project>,
    pub videos: MemoryVideoSlots,
    pub admins: MemoryAdmins,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewGalleryItem, VideoOrientation};
    use chrono::Duration;

    fn gallery_item(title: &str, age_secs: i64) -> GalleryItem {
        NewGalleryItem {
            title: title.to_string(),
            image_url: format!("https://cdn/{}.png", title),
            ..Default::default()
        }
        .into_document(Utc::now() - Duration::seconds(age_secs))
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let coll = MemoryCollection::<GalleryItem>::default();
        coll.insert(gallery_item("old", 60)).await.unwrap();
        coll.insert(gallery_item("new", 0)).await.unwrap();
        coll.insert(gallery_item("mid", 30)).await.unwrap();

        let titles: Vec<_> = coll
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_save_unknown_id_returns_none() {
        let coll = MemoryCollection::<GalleryItem>::default();
        let saved = coll.save(gallery_item("ghost", 0)).await.unwrap();
        assert!(saved.is_none());
        assert!(coll.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_leaves_collection() {
        let coll = MemoryCollection::<GalleryItem>::default();
        coll.insert(gallery_item("keep", 0)).await.unwrap();
        assert!(coll.delete(Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(coll.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_video_upsert_creates_then_updates() {
        let slots = MemoryVideoSlots::default();
        let five = SlotId::new(5).unwrap();

        let created = slots
            .upsert(
                five,
                VideoSlotUpdate {
                    title: Some("Showreel".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.views, 0);
        assert_eq!(created.orientation, VideoOrientation::Landscape);

        let updated = slots
            .upsert(
                five,
                VideoSlotUpdate {
                    description: Some("2025 cut".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Showreel");
        assert_eq!(updated.description, "2025 cut");
        assert_eq!(slots.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_video_list_is_slot_ascending() {
        let slots = MemoryVideoSlots::default();
        for n in [7, 2, 5] {
            slots
                .upsert(SlotId::new(n).unwrap(), VideoSlotUpdate::default())
                .await
                .unwrap();
        }
        let ids: Vec<u8> = slots
            .list()
            .await
            .unwrap()
            .iter()
            .map(|s| s.slot_id.get())
            .collect();
        assert_eq!(ids, vec![2, 5, 7]);
    }

    #[tokio::test]
    async fn test_admin_email_is_unique_case_insensitive() {
        let admins = MemoryAdmins::default();
        admins
            .insert(Admin::new("Admin@Sochlabs.com", "h"))
            .await
            .unwrap();
        assert!(admins
            .insert(Admin::new("admin@sochlabs.com", "h"))
            .await
            .is_err());
        assert!(admins
            .find_by_email("ADMIN@sochlabs.com")
            .await
            .unwrap()
            .is_some());
    }
}
