//! Database Models - typed documents, create payloads and patches for every
//! content collection, plus the validation shared by create and update paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Validation
// ============================================================================

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

/// A patch may omit a required field but must not blank it.
fn forbid_blank(field: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(v) => require(field, v),
        None => Ok(()),
    }
}

/// Parse a list field sent either as a JSON array or as a comma-joined string.
/// Entries are trimmed and empty entries are dropped.
pub fn parse_string_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
            return items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
    trimmed
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Format a duration in seconds as `m:ss`.
pub fn duration_text(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Common behaviour of every id-addressed document.
pub trait Document: Clone + Send + Sync + 'static {
    /// Collection name used in logs and not-found messages.
    const ENTITY: &'static str;

    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn touch(&mut self, at: DateTime<Utc>);
}

macro_rules! impl_document {
    ($ty:ty, $entity:literal) => {
        impl Document for $ty {
            const ENTITY: &'static str = $entity;

            fn id(&self) -> Uuid {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn touch(&mut self, at: DateTime<Utc>) {
                self.updated_at = at;
            }
        }
    };
}

// ============================================================================
// Gallery
// ============================================================================

/// Gallery image
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_document!(GalleryItem, "Gallery item");

#[derive(Debug, Clone, Default)]
pub struct NewGalleryItem {
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: String,
}

impl NewGalleryItem {
    /// Checks that do not depend on the uploaded image, run before uploading.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        require("title", &self.title)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_fields()?;
        require("image", &self.image_url)
    }

    pub fn into_document(self, now: DateTime<Utc>) -> GalleryItem {
        GalleryItem {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GalleryPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl GalleryPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        forbid_blank("title", &self.title)
    }

    pub fn apply(self, item: &mut GalleryItem) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(image_url) = self.image_url {
            item.image_url = image_url;
        }
    }
}

// ============================================================================
// Blog
// ============================================================================

/// Blog post
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_document!(BlogPost, "Blog post");

#[derive(Debug, Clone, Default)]
pub struct NewBlogPost {
    pub title: String,
    pub content: String,
    pub category: String,
    pub image_url: String,
}

impl NewBlogPost {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("content", &self.content)
    }

    pub fn into_document(self, now: DateTime<Utc>) -> BlogPost {
        BlogPost {
            id: Uuid::new_v4(),
            title: self.title,
            content: self.content,
            category: self.category,
            image_url: self.image_url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Blog post update, accepted as JSON or assembled from a multipart form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
}

impl BlogPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        forbid_blank("title", &self.title)?;
        forbid_blank("content", &self.content)
    }

    pub fn apply(self, post: &mut BlogPost) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(category) = self.category {
            post.category = category;
        }
        if let Some(image_url) = self.image_url {
            post.image_url = image_url;
        }
    }
}

// ============================================================================
// Client projects
// ============================================================================

/// Links attached to a client project. Stored inline with the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientProjectLink {
    #[serde(rename = "instagramLink", default)]
    pub instagram_link: String,
    #[serde(rename = "thumbnailURL", default)]
    pub thumbnail_url: String,
    #[serde(rename = "youtubeLink", default)]
    pub youtube_link: String,
}

/// Client project with its embedded link list
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientProject {
    pub id: Uuid,
    pub company: String,
    pub name: String,
    pub testimonial: String,
    pub work_did: String,
    #[sqlx(json)]
    pub projects: Vec<ClientProjectLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_document!(ClientProject, "Client project");

#[derive(Debug, Clone, Default)]
pub struct NewClientProject {
    pub company: String,
    pub name: String,
    pub testimonial: String,
    pub work_did: String,
    pub link: ClientProjectLink,
}

impl NewClientProject {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("company", &self.company)?;
        require("name", &self.name)
    }

    pub fn into_document(self, now: DateTime<Utc>) -> ClientProject {
        ClientProject {
            id: Uuid::new_v4(),
            company: self.company,
            name: self.name,
            testimonial: self.testimonial,
            work_did: self.work_did,
            projects: vec![self.link],
            created_at: now,
            updated_at: now,
        }
    }
}

/// Addressable field of a [`ClientProjectLink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    Instagram,
    Thumbnail,
    Youtube,
}

impl LinkField {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "instagramLink" => Some(Self::Instagram),
            "thumbnailURL" => Some(Self::Thumbnail),
            "youtubeLink" => Some(Self::Youtube),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdit {
    pub index: usize,
    pub field: LinkField,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClientProjectPatch {
    pub company: Option<String>,
    pub name: Option<String>,
    pub testimonial: Option<String>,
    pub work_did: Option<String>,
    pub links: Vec<LinkEdit>,
}

impl ClientProjectPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        forbid_blank("company", &self.company)?;
        forbid_blank("name", &self.name)
    }

    /// Merge into `project`. Edits run in index order whatever order they
    /// arrived in. Editing index `len` appends a fresh link; any index beyond
    /// that is rejected and leaves `project` untouched.
    pub fn apply(mut self, project: &mut ClientProject) -> Result<(), ValidationError> {
        self.links.sort_by_key(|edit| edit.index);
        let mut links = project.projects.clone();
        for edit in self.links {
            if edit.index == links.len() {
                links.push(ClientProjectLink::default());
            }
            let link = links.get_mut(edit.index).ok_or_else(|| {
                ValidationError::new(
                    "projects",
                    format!("link index {} is out of range", edit.index),
                )
            })?;
            match edit.field {
                LinkField::Instagram => link.instagram_link = edit.value,
                LinkField::Thumbnail => link.thumbnail_url = edit.value,
                LinkField::Youtube => link.youtube_link = edit.value,
            }
        }

        project.projects = links;
        if let Some(company) = self.company {
            project.company = company;
        }
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(testimonial) = self.testimonial {
            project.testimonial = testimonial;
        }
        if let Some(work_did) = self.work_did {
            project.work_did = work_did;
        }
        Ok(())
    }
}

// ============================================================================
// Testimonials
// ============================================================================

/// Customer testimonial
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: Uuid,
    pub user_name: String,
    pub designation: String,
    pub headline: String,
    pub description: String,
    #[serde(rename = "profilePictureURL")]
    pub profile_picture_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_document!(Testimonial, "Testimonial");

#[derive(Debug, Clone, Default)]
pub struct NewTestimonial {
    pub user_name: String,
    pub designation: String,
    pub headline: String,
    pub description: String,
    pub profile_picture_url: String,
}

impl NewTestimonial {
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        require("userName", &self.user_name)?;
        require("designation", &self.designation)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_fields()?;
        require("image", &self.profile_picture_url)
    }

    pub fn into_document(self, now: DateTime<Utc>) -> Testimonial {
        Testimonial {
            id: Uuid::new_v4(),
            user_name: self.user_name,
            designation: self.designation,
            headline: self.headline,
            description: self.description,
            profile_picture_url: self.profile_picture_url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Testimonial update (JSON body). Fields not present are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialPatch {
    pub user_name: Option<String>,
    pub designation: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "profilePictureURL")]
    pub profile_picture_url: Option<String>,
}

impl TestimonialPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        forbid_blank("userName", &self.user_name)?;
        forbid_blank("designation", &self.designation)
    }

    pub fn apply(self, testimonial: &mut Testimonial) {
        if let Some(user_name) = self.user_name {
            testimonial.user_name = user_name;
        }
        if let Some(designation) = self.designation {
            testimonial.designation = designation;
        }
        if let Some(headline) = self.headline {
            testimonial.headline = headline;
        }
        if let Some(description) = self.description {
            testimonial.description = description;
        }
        if let Some(url) = self.profile_picture_url {
            testimonial.profile_picture_url = url;
        }
    }
}

// ============================================================================
// Projects
// ============================================================================

/// Portfolio project
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub description: String,
    pub image: String,
    pub tags: Vec<String>,
    pub status: String,
    pub likes: i64,
    pub views: i64,
    pub year: String,
    pub client: String,
    pub duration: String,
    pub tools: Vec<String>,
    pub color: String,
    pub link: String,
    pub github_url: String,
    pub video_demo_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_document!(Project, "Project");

pub const DEFAULT_PROJECT_COLOR: &str = "#000000";

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub category: String,
    pub description: String,
    pub image: String,
    pub tags: Vec<String>,
    /// Required: there is no implicit default status.
    pub status: String,
    pub year: String,
    pub client: String,
    pub duration: String,
    pub tools: Vec<String>,
    pub color: Option<String>,
    pub link: String,
    pub github_url: String,
    pub video_demo_url: String,
}

impl NewProject {
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("category", &self.category)?;
        require("description", &self.description)?;
        require("status", &self.status)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_fields()?;
        require("image", &self.image)
    }

    pub fn into_document(self, now: DateTime<Utc>) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: self.title,
            category: self.category,
            description: self.description,
            image: self.image,
            tags: self.tags,
            status: self.status,
            likes: 0,
            views: 0,
            year: self.year,
            client: self.client,
            duration: self.duration,
            tools: self.tools,
            color: self
                .color
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
            link: self.link,
            github_url: self.github_url,
            video_demo_url: self.video_demo_url,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
    pub likes: Option<i64>,
    pub views: Option<i64>,
    pub year: Option<String>,
    pub client: Option<String>,
    pub duration: Option<String>,
    pub tools: Option<Vec<String>>,
    pub color: Option<String>,
    pub link: Option<String>,
    pub github_url: Option<String>,
    pub video_demo_url: Option<String>,
}

impl ProjectPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        forbid_blank("title", &self.title)?;
        forbid_blank("category", &self.category)?;
        forbid_blank("description", &self.description)?;
        forbid_blank("status", &self.status)?;
        if matches!(self.likes, Some(n) if n < 0) {
            return Err(ValidationError::new("likes", "must not be negative"));
        }
        if matches!(self.views, Some(n) if n < 0) {
            return Err(ValidationError::new("views", "must not be negative"));
        }
        Ok(())
    }

    pub fn apply(self, project: &mut Project) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    project.$field = value;
                })*
            };
        }
        merge!(
            title,
            category,
            description,
            image,
            tags,
            status,
            likes,
            views,
            year,
            client,
            duration,
            tools,
            color,
            link,
            github_url,
            video_demo_url,
        );
    }
}

// ============================================================================
// Video slots
// ============================================================================

/// Number of addressable video slots.
pub const SLOT_COUNT: u8 = 8;

/// Slot key in `1..=8`. Slots 1-4 are portrait, 5-8 landscape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct SlotId(u8);

impl SlotId {
    pub fn new(value: i64) -> Option<Self> {
        if (1..=SLOT_COUNT as i64).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn orientation(self) -> VideoOrientation {
        if self.0 <= 4 {
            VideoOrientation::Portrait
        } else {
            VideoOrientation::Landscape
        }
    }

    pub fn all() -> impl Iterator<Item = SlotId> {
        (1..=SLOT_COUNT).map(SlotId)
    }
}

impl TryFrom<i64> for SlotId {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        SlotId::new(value).ok_or_else(|| format!("slotId must be 1..{}", SLOT_COUNT))
    }
}

impl TryFrom<i16> for SlotId {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        SlotId::try_from(value as i64)
    }
}

impl From<SlotId> for i64 {
    fn from(slot: SlotId) -> Self {
        slot.0 as i64
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoOrientation {
    Portrait,
    Landscape,
}

impl VideoOrientation {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoOrientation::Portrait => "portrait",
            VideoOrientation::Landscape => "landscape",
        }
    }
}

impl TryFrom<String> for VideoOrientation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "portrait" => Ok(VideoOrientation::Portrait),
            "landscape" => Ok(VideoOrientation::Landscape),
            other => Err(format!("unknown video orientation '{}'", other)),
        }
    }
}

/// One of the fixed video gallery slots
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoSlot {
    #[sqlx(try_from = "i16")]
    pub slot_id: SlotId,
    pub title: String,
    pub description: String,
    /// Seconds
    pub duration: i32,
    pub duration_text: String,
    pub views: i64,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub orientation: VideoOrientation,
    pub category: String,
    pub is_live: bool,
    pub thumbnail_url: String,
    pub video_url: String,
    pub video_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoSlot {
    /// Fresh record for a slot that has never been written.
    pub fn empty(slot_id: SlotId, now: DateTime<Utc>) -> Self {
        Self {
            slot_id,
            title: String::new(),
            description: String::new(),
            duration: 0,
            duration_text: String::new(),
            views: 0,
            orientation: slot_id.orientation(),
            category: String::new(),
            is_live: false,
            thumbnail_url: String::new(),
            video_url: String::new(),
            video_type: "mp4".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Hosted video file written into a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotVideo {
    pub url: String,
    pub video_type: String,
    pub duration_secs: Option<f64>,
}

/// Fields written by an upsert. There is deliberately no orientation here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoSlotUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_live: bool,
    pub video: Option<SlotVideo>,
    pub thumbnail_url: Option<String>,
}

impl VideoSlotUpdate {
    pub fn apply(self, slot: &mut VideoSlot) {
        if let Some(title) = self.title {
            slot.title = title;
        }
        if let Some(description) = self.description {
            slot.description = description;
        }
        if let Some(category) = self.category {
            slot.category = category;
        }
        slot.is_live = self.is_live;
        if let Some(video) = self.video {
            slot.video_url = video.url;
            slot.video_type = video.video_type;
            if let Some(secs) = video.duration_secs {
                slot.duration = secs.round() as i32;
                slot.duration_text = duration_text(secs);
            }
        }
        if let Some(url) = self.thumbnail_url {
            slot.thumbnail_url = url;
        }
        slot.orientation = slot.slot_id.orientation();
    }
}

// ============================================================================
// Admins
// ============================================================================

/// Admin account. The password hash never leaves the server.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
