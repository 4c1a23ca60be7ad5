use crate::embeddings::Embedder;
use crate::splitter::TextSplitter;
use crate::vector_index::{Metadata, VectorIndex};
use common::VectorStoreError;
use domain::{Lesson, LessonPlan, Prop, TimetableEntry};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Collection {
    Timetables,
    Lessons,
    Props,
    Documents,
    UserContext,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Timetables,
        Collection::Lessons,
        Collection::Props,
        Collection::Documents,
        Collection::UserContext,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Timetables => "timetables",
            Collection::Lessons => "lessons",
            Collection::Props => "props",
            Collection::Documents => "documents",
            Collection::UserContext => "user_context",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Collection::Timetables => "School timetables and schedules",
            Collection::Lessons => "Lesson plans and lesson details",
            Collection::Props => "Sports equipment and props data",
            Collection::Documents => "Reports, guidelines, and documentation",
            Collection::UserContext => "User preferences and context data",
        }
    }
}

impl FromStr for Collection {
    type Err = VectorStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == s.trim().to_lowercase())
            .ok_or_else(|| VectorStoreError::UnknownCollection(s.to_string()))
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which collections a semantic lookup covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextType {
    All,
    Timetables,
    Lessons,
    Props,
    Documents,
}

impl ContextType {
    /// Unknown values widen to `All`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "timetables" | "timetable" => ContextType::Timetables,
            "lessons" | "lesson" => ContextType::Lessons,
            "props" | "prop" => ContextType::Props,
            "documents" | "document" | "docs" => ContextType::Documents,
            _ => ContextType::All,
        }
    }

    fn includes(&self, collection: Collection) -> bool {
        match self {
            ContextType::All => collection != Collection::UserContext,
            ContextType::Timetables => collection == Collection::Timetables,
            ContextType::Lessons => collection == Collection::Lessons,
            ContextType::Props => collection == Collection::Props,
            ContextType::Documents => collection == Collection::Documents,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub collection: Collection,
    pub document: String,
    pub metadata: Metadata,
    pub distance: f32,
    /// `1 - distance`
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VectorStoreStats {
    pub persist_dir: PathBuf,
    pub embedder: String,
    pub collections: Vec<(String, usize)>,
}

impl VectorStoreStats {
    pub fn total_documents(&self) -> usize {
        self.collections.iter().map(|(_, n)| n).sum()
    }
}

/// Collections of embedded SportzVillage data, persisted as one JSON file
/// per collection under `persist_dir`.
pub struct VectorStore {
    persist_dir: PathBuf,
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    collections: RwLock<HashMap<Collection, VectorIndex>>,
}

impl VectorStore {
    /// Open the store, loading any collections already persisted.
    pub async fn open(
        persist_dir: impl Into<PathBuf>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, VectorStoreError> {
        let persist_dir = persist_dir.into();
        tokio::fs::create_dir_all(&persist_dir).await?;

        let mut collections = HashMap::new();
        for collection in Collection::ALL {
            let path = collection_path(&persist_dir, collection);
            let index = if path.exists() {
                let raw = tokio::fs::read_to_string(&path).await?;
                serde_json::from_str(&raw).map_err(|e| VectorStoreError::Persistence {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?
            } else {
                VectorIndex::new()
            };
            collections.insert(collection, index);
        }

        info!(dir = %persist_dir.display(), embedder = %embedder.name(), "Vector store opened");

        Ok(Self {
            persist_dir,
            embedder,
            splitter: TextSplitter::default(),
            collections: RwLock::new(collections),
        })
    }

    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    /// Embed and upsert `(id, document, metadata)` triples in one batch.
    pub async fn upsert(
        &self,
        collection: Collection,
        items: Vec<(String, String, Metadata)>,
    ) -> Result<usize, VectorStoreError> {
        if items.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = items.iter().map(|(_, doc, _)| doc.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        let mut collections = self.collections.write().await;
        let index = collections.entry(collection).or_default();
        let count = items.len();
        for ((id, document, metadata), vector) in items.into_iter().zip(vectors) {
            index.upsert(id, vector, document, metadata)?;
        }

        debug!(collection = %collection, count, "Upserted documents");
        Ok(count)
    }

    pub async fn index_timetables(&self, entries: &[TimetableEntry]) -> Result<usize, VectorStoreError> {
        let items = entries
            .iter()
            .map(|entry| {
                let text = format!(
                    "School: {}\nClass: {} Section: {}\nPeriod: {} ({})\nSubject: {}\nPE Period: {}",
                    entry.school_id,
                    entry.class,
                    entry.section,
                    entry.period_number,
                    entry.time_slot,
                    entry.subject,
                    entry.is_pe_period
                );
                let metadata = metadata_from(json!({
                    "school_id": entry.school_id,
                    "class": entry.class,
                    "section": entry.section,
                    "period_number": entry.period_number,
                    "subject": entry.subject,
                    "type": "timetable",
                }));
                let id = format!(
                    "tt_{}_{}_{}_{}",
                    entry.school_id, entry.class, entry.section, entry.period_number
                );
                (id, text, metadata)
            })
            .collect();

        let count = self.upsert(Collection::Timetables, items).await?;
        info!("Indexed {} timetable entries", count);
        Ok(count)
    }

    pub async fn index_lessons(
        &self,
        lessons: &[Lesson],
        plans: &[LessonPlan],
    ) -> Result<usize, VectorStoreError> {
        let mut items: Vec<(String, String, Metadata)> = lessons
            .iter()
            .map(|lesson| {
                let text = format!(
                    "Lesson: {}\nDescription: {}\nDuration: {} minutes\nRequired Props: {}",
                    lesson.name,
                    lesson.description,
                    lesson.duration,
                    lesson.required_props.join(", ")
                );
                let metadata = metadata_from(json!({
                    "lesson_id": lesson.lesson_id,
                    "name": lesson.name,
                    "duration": lesson.duration,
                    "type": "lesson",
                }));
                (format!("lesson_{}", lesson.lesson_id), text, metadata)
            })
            .collect();

        items.extend(plans.iter().map(|plan| {
            let text = format!(
                "Lesson Plan: {}\nSchool: {}\nSession: {}\nLessons: {}",
                plan.lesson_plan_id,
                plan.school_id,
                plan.session,
                plan.lessons.join(", ")
            );
            let metadata = metadata_from(json!({
                "lesson_plan_id": plan.lesson_plan_id,
                "school_id": plan.school_id,
                "session": plan.session,
                "type": "lesson_plan",
            }));
            (format!("lp_{}", plan.lesson_plan_id), text, metadata)
        }));

        let count = self.upsert(Collection::Lessons, items).await?;
        info!("Indexed {} lesson entries", count);
        Ok(count)
    }

    pub async fn index_props(&self, props: &[Prop]) -> Result<usize, VectorStoreError> {
        let items = props
            .iter()
            .map(|prop| {
                let text = format!(
                    "Prop: {}\nSchool: {}\nTotal Quantity: {}\nAvailable: {}\nStatus: {}\nUtilization: {:.1}%",
                    prop.prop_type,
                    prop.school_id,
                    prop.quantity,
                    prop.available,
                    prop.status,
                    prop.utilization_percent()
                );
                let metadata = metadata_from(json!({
                    "prop_id": prop.prop_id,
                    "type": prop.prop_type,
                    "school_id": prop.school_id,
                    "quantity": prop.quantity,
                    "available": prop.available,
                    "status": prop.status,
                }));
                (format!("prop_{}", prop.prop_id), text, metadata)
            })
            .collect();

        let count = self.upsert(Collection::Props, items).await?;
        info!("Indexed {} props entries", count);
        Ok(count)
    }

    /// Nearest documents in one collection matching `filter`.
    pub async fn query(
        &self,
        collection: Collection,
        query: &str,
        n: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let vector = self.embed_query(query).await?;
        let collections = self.collections.read().await;
        let Some(index) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        Ok(index
            .query(&vector, n, filter)?
            .into_iter()
            .map(|hit| SearchHit {
                id: hit.id,
                collection,
                document: hit.document,
                metadata: hit.metadata,
                distance: hit.distance,
                score: 1.0 - hit.distance,
            })
            .collect())
    }

    pub async fn search_timetables(
        &self,
        query: &str,
        school_id: Option<&str>,
        class_name: Option<&str>,
        n: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let mut filter = Metadata::new();
        if let Some(school) = school_id {
            filter.insert("school_id".into(), json!(school));
        }
        if let Some(class) = class_name {
            filter.insert("class".into(), json!(class));
        }
        self.query(Collection::Timetables, query, n, non_empty(&filter))
            .await
    }

    pub async fn search_lessons(
        &self,
        query: &str,
        school_id: Option<&str>,
        n: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let filter = school_filter(school_id);
        self.query(Collection::Lessons, query, n, non_empty(&filter))
            .await
    }

    pub async fn search_props(
        &self,
        query: &str,
        school_id: Option<&str>,
        n: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let filter = school_filter(school_id);
        self.query(Collection::Props, query, n, non_empty(&filter))
            .await
    }

    pub async fn search_documents(
        &self,
        query: &str,
        n: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        self.query(Collection::Documents, query, n, filter).await
    }

    /// Search the collections selected by `context_type`, merged by distance.
    pub async fn search_in(
        &self,
        query: &str,
        context_type: ContextType,
        school_id: Option<&str>,
        n: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let mut hits = Vec::new();
        if context_type.includes(Collection::Timetables) {
            hits.extend(self.search_timetables(query, school_id, None, n).await?);
        }
        if context_type.includes(Collection::Lessons) {
            hits.extend(self.search_lessons(query, school_id, n).await?);
        }
        if context_type.includes(Collection::Props) {
            hits.extend(self.search_props(query, school_id, n).await?);
        }
        if context_type.includes(Collection::Documents) {
            hits.extend(self.search_documents(query, n, None).await?);
        }

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(n);
        Ok(hits)
    }

    /// Labelled context blocks for prompting. Empty when nothing matches.
    pub async fn retrieve_relevant_context(
        &self,
        query: &str,
        context_type: ContextType,
        school_id: Option<&str>,
        n: usize,
    ) -> Result<String, VectorStoreError> {
        let hits = self.search_in(query, context_type, school_id, n).await?;
        let parts: Vec<String> = hits
            .iter()
            .map(|hit| {
                let label = match hit.collection {
                    Collection::Timetables => "Timetable",
                    Collection::Lessons => "Lesson",
                    Collection::Props => "Props",
                    Collection::Documents => "Document",
                    Collection::UserContext => "Context",
                };
                format!("{}: {}", label, hit.document)
            })
            .collect();
        Ok(parts.join("\n\n"))
    }

    /// Split `content` and store each chunk as `<doc_id>_chunk_<i>`.
    pub async fn store_document(
        &self,
        doc_id: &str,
        content: &str,
        metadata: Metadata,
    ) -> Result<usize, VectorStoreError> {
        let chunks = self.splitter.split_text(content);
        let total = chunks.len();
        let items = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let mut chunk_meta = metadata.clone();
                chunk_meta.insert("chunk_id".into(), json!(i));
                chunk_meta.insert("total_chunks".into(), json!(total));
                chunk_meta.insert("type".into(), json!("document"));
                chunk_meta.insert("doc_id".into(), json!(doc_id));
                (format!("{}_chunk_{}", doc_id, i), chunk, chunk_meta)
            })
            .collect();

        let count = self.upsert(Collection::Documents, items).await?;
        debug!(doc_id, chunks = count, "Stored document");
        Ok(count)
    }

    pub async fn cache_user_context(
        &self,
        user_id: &str,
        role: &str,
        school_id: Option<&str>,
        context: &Value,
    ) -> Result<(), VectorStoreError> {
        let pretty = |key: &str| {
            serde_json::to_string_pretty(context.get(key).unwrap_or(&json!({})))
                .unwrap_or_else(|_| "{}".to_string())
        };
        let text = format!(
            "User: {}\nRole: {}\nSchool: {}\nRecent Activity: {}\nPreferences: {}",
            user_id,
            role,
            school_id.unwrap_or("Unknown"),
            pretty("recent_activity"),
            pretty("preferences")
        );
        let mut metadata = metadata_from(json!({
            "user_id": user_id,
            "role": role,
            "type": "user_context",
        }));
        if let Some(school) = school_id {
            metadata.insert("school_id".into(), json!(school));
        }
        metadata.insert("context".into(), context.clone());

        self.upsert(
            Collection::UserContext,
            vec![(format!("context_{}", user_id), text, metadata)],
        )
        .await?;
        Ok(())
    }

    /// The context cached for `user_id`, if any.
    pub async fn get_cached_context(&self, user_id: &str) -> Option<Value> {
        let collections = self.collections.read().await;
        collections
            .get(&Collection::UserContext)?
            .get(&format!("context_{}", user_id))
            .and_then(|doc| doc.metadata.get("context").cloned())
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, VectorIndex::len)
    }

    pub async fn stats(&self) -> VectorStoreStats {
        let collections = self.collections.read().await;
        VectorStoreStats {
            persist_dir: self.persist_dir.clone(),
            embedder: self.embedder.name(),
            collections: Collection::ALL
                .iter()
                .map(|c| {
                    (
                        c.name().to_string(),
                        collections.get(c).map_or(0, VectorIndex::len),
                    )
                })
                .collect(),
        }
    }

    /// Drop every document in every collection, on disk too.
    pub async fn reset(&self) -> Result<(), VectorStoreError> {
        {
            let mut collections = self.collections.write().await;
            for index in collections.values_mut() {
                index.clear();
            }
        }
        warn!(dir = %self.persist_dir.display(), "Vector store reset");
        self.persist().await
    }

    pub async fn persist(&self) -> Result<(), VectorStoreError> {
        let collections = self.collections.read().await;
        for (collection, index) in collections.iter() {
            let path = collection_path(&self.persist_dir, *collection);
            let raw = serde_json::to_string(index).map_err(|e| VectorStoreError::Persistence {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, raw).await?;
            tokio::fs::rename(&tmp, &path).await?;
        }
        debug!(dir = %self.persist_dir.display(), "Vector store persisted");
        Ok(())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, VectorStoreError> {
        self.embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VectorStoreError::Embedding("embedder returned no vector".into()))
    }
}

fn collection_path(dir: &Path, collection: Collection) -> PathBuf {
    dir.join(format!("{}.json", collection.name()))
}

fn metadata_from(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => Metadata::new(),
    }
}

fn school_filter(school_id: Option<&str>) -> Metadata {
    let mut filter = Metadata::new();
    if let Some(school) = school_id {
        filter.insert("school_id".into(), json!(school));
    }
    filter
}

fn non_empty(filter: &Metadata) -> Option<&Metadata> {
    if filter.is_empty() {
        None
    } else {
        Some(filter)
    }
}
