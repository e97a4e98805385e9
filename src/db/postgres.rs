//! Postgres backend.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    Admin, BlogPost, ClientProject, GalleryItem, Project, SlotId, Testimonial, VideoSlot,
    VideoSlotUpdate,
};
use super::store::{Admins, Collection, StoreError, VideoSlots};
use crate::db::models::duration_text;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique(e: sqlx::Error, what: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("{} already exists", what))
        }
        _ => StoreError::Database(e),
    }
}

// ============================================================================
// Gallery
// ============================================================================

const GALLERY_COLUMNS: &str =
    "id, title, description, category, image_url, created_at, updated_at";

#[async_trait]
impl Collection<GalleryItem> for PgStore {
    async fn list(&self) -> Result<Vec<GalleryItem>, StoreError> {
        let sql = format!(
            "SELECT {} FROM gallery_items ORDER BY created_at DESC",
            GALLERY_COLUMNS
        );
        Ok(sqlx::query_as::<_, GalleryItem>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<GalleryItem>, StoreError> {
        let sql = format!("SELECT {} FROM gallery_items WHERE id = $1", GALLERY_COLUMNS);
        Ok(sqlx::query_as::<_, GalleryItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, doc: GalleryItem) -> Result<GalleryItem, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO gallery_items (id, title, description, category, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {}
            "#,
            GALLERY_COLUMNS
        );
        sqlx::query_as::<_, GalleryItem>(&sql)
            .bind(doc.id)
            .bind(&doc.title)
            .bind(&doc.description)
            .bind(&doc.category)
            .bind(&doc.image_url)
            .bind(doc.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "gallery item"))
    }

    async fn save(&self, doc: GalleryItem) -> Result<Option<GalleryItem>, StoreError> {
        let sql = format!(
            r#"
            UPDATE gallery_items
            SET title = $2, description = $3, category = $4, image_url = $5, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            GALLERY_COLUMNS
        );
        Ok(sqlx::query_as::<_, GalleryItem>(&sql)
            .bind(doc.id)
            .bind(&doc.title)
            .bind(&doc.description)
            .bind(&doc.category)
            .bind(&doc.image_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<GalleryItem>, StoreError> {
        let sql = format!(
            "DELETE FROM gallery_items WHERE id = $1 RETURNING {}",
            GALLERY_COLUMNS
        );
        Ok(sqlx::query_as::<_, GalleryItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

// ============================================================================
// Blog
// ============================================================================

const BLOG_COLUMNS: &str = "id, title, content, category, image_url, created_at, updated_at";

#[async_trait]
impl Collection<BlogPost> for PgStore {
    async fn list(&self) -> Result<Vec<BlogPost>, StoreError> {
        let sql = format!(
            "SELECT {} FROM blog_posts ORDER BY created_at DESC",
            BLOG_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        let sql = format!("SELECT {} FROM blog_posts WHERE id = $1", BLOG_COLUMNS);
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, doc: BlogPost) -> Result<BlogPost, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO blog_posts (id, title, content, category, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {}
            "#,
            BLOG_COLUMNS
        );
        sqlx::query_as::<_, BlogPost>(&sql)
            .bind(doc.id)
            .bind(&doc.title)
            .bind(&doc.content)
            .bind(&doc.category)
            .bind(&doc.image_url)
            .bind(doc.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "blog post"))
    }

    async fn save(&self, doc: BlogPost) -> Result<Option<BlogPost>, StoreError> {
        let sql = format!(
            r#"
            UPDATE blog_posts
            SET title = $2, content = $3, category = $4, image_url = $5, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            BLOG_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(doc.id)
            .bind(&doc.title)
            .bind(&doc.content)
            .bind(&doc.category)
            .bind(&doc.image_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        let sql = format!(
            "DELETE FROM blog_posts WHERE id = $1 RETURNING {}",
            BLOG_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

// ============================================================================
// Client projects
// ============================================================================

const CLIENT_PROJECT_COLUMNS: &str =
    "id, company, name, testimonial, work_did, projects, created_at, updated_at";

#[async_trait]
impl Collection<ClientProject> for PgStore {
    async fn list(&self) -> Result<Vec<ClientProject>, StoreError> {
        let sql = format!(
            "SELECT {} FROM client_projects ORDER BY created_at DESC",
            CLIENT_PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ClientProject>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ClientProject>, StoreError> {
        let sql = format!(
            "SELECT {} FROM client_projects WHERE id = $1",
            CLIENT_PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ClientProject>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, doc: ClientProject) -> Result<ClientProject, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO client_projects (id, company, name, testimonial, work_did, projects, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {}
            "#,
            CLIENT_PROJECT_COLUMNS
        );
        sqlx::query_as::<_, ClientProject>(&sql)
            .bind(doc.id)
            .bind(&doc.company)
            .bind(&doc.name)
            .bind(&doc.testimonial)
            .bind(&doc.work_did)
            .bind(Json(&doc.projects))
            .bind(doc.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "client project"))
    }

    async fn save(&self, doc: ClientProject) -> Result<Option<ClientProject>, StoreError> {
        let sql = format!(
            r#"
            UPDATE client_projects
            SET company = $2, name = $3, testimonial = $4, work_did = $5, projects = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            CLIENT_PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ClientProject>(&sql)
            .bind(doc.id)
            .bind(&doc.company)
            .bind(&doc.name)
            .bind(&doc.testimonial)
            .bind(&doc.work_did)
            .bind(Json(&doc.projects))
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<ClientProject>, StoreError> {
        let sql = format!(
            "DELETE FROM client_projects WHERE id = $1 RETURNING {}",
            CLIENT_PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ClientProject>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

// ============================================================================
// Testimonials
// ============================================================================

const TESTIMONIAL_COLUMNS: &str = "id, user_name, designation, headline, description, \
     profile_picture_url, created_at, updated_at";

#[async_trait]
impl Collection<Testimonial> for PgStore {
    async fn list(&self) -> Result<Vec<Testimonial>, StoreError> {
        let sql = format!(
            "SELECT {} FROM testimonials ORDER BY created_at DESC",
            TESTIMONIAL_COLUMNS
        );
        Ok(sqlx::query_as::<_, Testimonial>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Testimonial>, StoreError> {
        let sql = format!(
            "SELECT {} FROM testimonials WHERE id = $1",
            TESTIMONIAL_COLUMNS
        );
        Ok(sqlx::query_as::<_, Testimonial>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, doc: Testimonial) -> Result<Testimonial, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO testimonials (id, user_name, designation, headline, description,
                                      profile_picture_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {}
            "#,
            TESTIMONIAL_COLUMNS
        );
        sqlx::query_as::<_, Testimonial>(&sql)
            .bind(doc.id)
            .bind(&doc.user_name)
            .bind(&doc.designation)
            .bind(&doc.headline)
            .bind(&doc.description)
            .bind(&doc.profile_picture_url)
            .bind(doc.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "testimonial"))
    }

    async fn save(&self, doc: Testimonial) -> Result<Option<Testimonial>, StoreError> {
        let sql = format!(
            r#"
            UPDATE testimonials
            SET user_name = $2, designation = $3, headline = $4, description = $5,
                profile_picture_url = $6, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            TESTIMONIAL_COLUMNS
        );
        Ok(sqlx::query_as::<_, Testimonial>(&sql)
            .bind(doc.id)
            .bind(&doc.user_name)
            .bind(&doc.designation)
            .bind(&doc.headline)
            .bind(&doc.description)
            .bind(&doc.profile_picture_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Testimonial>, StoreError> {
        let sql = format!(
            "DELETE FROM testimonials WHERE id = $1 RETURNING {}",
            TESTIMONIAL_COLUMNS
        );
        Ok(sqlx::query_as::<_, Testimonial>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

// ============================================================================
// Projects
// ============================================================================

const PROJECT_COLUMNS: &str = "id, title, category, description, image, tags, status, likes, \
     views, year, client, duration, tools, color, link, github_url, video_demo_url, \
     created_at, updated_at";

#[async_trait]
impl Collection<Project> for PgStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let sql = format!(
            "SELECT {} FROM projects ORDER BY created_at DESC",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, doc: Project) -> Result<Project, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO projects (id, title, category, description, image, tags, status, likes,
                                  views, year, client, duration, tools, color, link, github_url,
                                  video_demo_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $18)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(doc.id)
            .bind(&doc.title)
            .bind(&doc.category)
            .bind(&doc.description)
            .bind(&doc.image)
            .bind(&doc.tags)
            .bind(&doc.status)
            .bind(doc.likes)
            .bind(doc.views)
            .bind(&doc.year)
            .bind(&doc.client)
            .bind(&doc.duration)
            .bind(&doc.tools)
            .bind(&doc.color)
            .bind(&doc.link)
            .bind(&doc.github_url)
            .bind(&doc.video_demo_url)
            .bind(doc.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "project"))
    }

    async fn save(&self, doc: Project) -> Result<Option<Project>, StoreError> {
        let sql = format!(
            r#"
            UPDATE projects
            SET title = $2, category = $3, description = $4, image = $5, tags = $6, status = $7,
                likes = $8, views = $9, year = $10, client = $11, duration = $12, tools = $13,
                color = $14, link = $15, github_url = $16, video_demo_url = $17,
                updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(doc.id)
            .bind(&doc.title)
            .bind(&doc.category)
            .bind(&doc.description)
            .bind(&doc.image)
            .bind(&doc.tags)
            .bind(&doc.status)
            .bind(doc.likes)
            .bind(doc.views)
            .bind(&doc.year)
            .bind(&doc.client)
            .bind(&doc.duration)
            .bind(&doc.tools)
            .bind(&doc.color)
            .bind(&doc.link)
            .bind(&doc.github_url)
            .bind(&doc.video_demo_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let sql = format!(
            "DELETE FROM projects WHERE id = $1 RETURNING {}",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

// ============================================================================
// Video slots
// ============================================================================

const VIDEO_COLUMNS: &str = "slot_id, title, description, duration, duration_text, views, \
     orientation, category, is_live, thumbnail_url, video_url, video_type, created_at, updated_at";

#[async_trait]
impl VideoSlots for PgStore {
    async fn list(&self) -> Result<Vec<VideoSlot>, StoreError> {
        let sql = format!(
            "SELECT {} FROM video_slots ORDER BY slot_id ASC",
            VIDEO_COLUMNS
        );
        Ok(sqlx::query_as::<_, VideoSlot>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, slot: SlotId) -> Result<Option<VideoSlot>, StoreError> {
        let sql = format!("SELECT {} FROM video_slots WHERE slot_id = $1", VIDEO_COLUMNS);
        Ok(sqlx::query_as::<_, VideoSlot>(&sql)
            .bind(slot.get() as i16)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn upsert(
        &self,
        slot: SlotId,
        update: VideoSlotUpdate,
    ) -> Result<VideoSlot, StoreError> {
        let (video_url, video_type, duration, duration_txt) = match &update.video {
            Some(video) => (
                Some(video.url.clone()),
                Some(video.video_type.clone()),
                video.duration_secs.map(|d| d.round() as i32),
                video.duration_secs.map(duration_text),
            ),
            None => (None, None, None, None),
        };

        // NULL parameters keep the stored value on conflict and fall back to
        // the column default on insert. Orientation is always rewritten.
        let sql = format!(
            r#"
            INSERT INTO video_slots (slot_id, title, description, category, is_live, video_url,
                                     video_type, duration, duration_text, thumbnail_url,
                                     orientation, views, created_at, updated_at)
            VALUES ($1, COALESCE($2, ''), COALESCE($3, ''), COALESCE($4, ''), $5,
                    COALESCE($6, ''), COALESCE($7, 'mp4'), COALESCE($8, 0), COALESCE($9, ''),
                    COALESCE($10, ''), $11, 0, now(), now())
            ON CONFLICT (slot_id) DO UPDATE SET
                title = COALESCE($2, video_slots.title),
                description = COALESCE($3, video_slots.description),
                category = COALESCE($4, video_slots.category),
                is_live = $5,
                video_url = COALESCE($6, video_slots.video_url),
                video_type = COALESCE($7, video_slots.video_type),
                duration = COALESCE($8, video_slots.duration),
                duration_text = COALESCE($9, video_slots.duration_text),
                thumbnail_url = COALESCE($10, video_slots.thumbnail_url),
                orientation = $11,
                updated_at = now()
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        );

        Ok(sqlx::query_as::<_, VideoSlot>(&sql)
            .bind(slot.get() as i16)
            .bind(&update.title)
            .bind(&update.description)
            .bind(&update.category)
            .bind(update.is_live)
            .bind(&video_url)
            .bind(&video_type)
            .bind(duration)
            .bind(&duration_txt)
            .bind(&update.thumbnail_url)
            .bind(slot.orientation().as_str())
            .fetch_one(&self.pool)
            .await?)
    }
}

// ============================================================================
// Admins
// ============================================================================

const ADMIN_COLUMNS: &str = "id, email, password_hash, created_at, updated_at";

#[async_trait]
impl Admins for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        let sql = format!("SELECT {} FROM admins WHERE id = $1", ADMIN_COLUMNS);
        Ok(sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let sql = format!(
            "SELECT {} FROM admins WHERE LOWER(email) = LOWER($1)",
            ADMIN_COLUMNS
        );
        Ok(sqlx::query_as::<_, Admin>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, admin: Admin) -> Result<Admin, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO admins (id, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {}
            "#,
            ADMIN_COLUMNS
        );
        sqlx::query_as::<_, Admin>(&sql)
            .bind(admin.id)
            .bind(&admin.email)
            .bind(&admin.password_hash)
            .bind(admin.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "admin"))
    }
}
