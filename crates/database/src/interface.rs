use crate::mysql::MySqlDatabase;
use crate::text_db::TextDatabase;
use async_trait::async_trait;
use common::{DatabaseConfig, DatabaseError, DatabaseKind, SvError};
use domain::{
    DateRange, Event, Lesson, LessonCompletion, LessonPlan, Prop, PropUpdate, TimetableEntry, User,
};
use memory::{ContextType, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Everything the tools and the agent may ask of the operational data.
///
/// "Not found" is `Ok(None)` or an empty vec; `Err` is reserved for storage
/// failures.
#[async_trait]
pub trait Database: Send + Sync {
    /// Short backend identifier (`text`, `mysql`).
    fn backend_name(&self) -> &'static str;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError>;

    async fn authenticate_user(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<Option<User>, DatabaseError>;

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    async fn get_timetable(
        &self,
        school_id: &str,
        class_name: Option<&str>,
        section: Option<&str>,
    ) -> Result<Vec<TimetableEntry>, DatabaseError>;

    async fn get_lesson_plans(&self, school_id: &str) -> Result<Vec<LessonPlan>, DatabaseError>;

    /// All lessons, or only those listed by `lesson_plan_id`.
    async fn get_lessons(&self, lesson_plan_id: Option<&str>) -> Result<Vec<Lesson>, DatabaseError>;

    async fn get_props(&self, school_id: Option<&str>) -> Result<Vec<Prop>, DatabaseError>;

    async fn get_events(
        &self,
        school_id: &str,
        date_range: Option<&DateRange>,
    ) -> Result<Vec<Event>, DatabaseError>;

    async fn log_lesson_completion(
        &self,
        completion: LessonCompletion,
    ) -> Result<bool, DatabaseError>;

    async fn update_prop_status(
        &self,
        prop_id: &str,
        status: &str,
        resident_id: &str,
        notes: Option<&str>,
    ) -> Result<bool, DatabaseError>;

    /// Users whose `reports_to` is `manager_id`.
    async fn get_residents_under_manager(
        &self,
        manager_id: &str,
    ) -> Result<Vec<User>, DatabaseError>;

    async fn get_lesson_completions(
        &self,
        school_id: Option<&str>,
        date_range: Option<&DateRange>,
    ) -> Result<Vec<LessonCompletion>, DatabaseError>;

    async fn get_prop_updates(
        &self,
        resident_id: Option<&str>,
    ) -> Result<Vec<PropUpdate>, DatabaseError>;

    /// Rendered search results, ready to hand to the model.
    async fn semantic_search(
        &self,
        query: &str,
        context_type: ContextType,
        school_id: Option<&str>,
    ) -> Result<String, DatabaseError>;

    /// Re-index operational data into the vector store. `false` when there
    /// is no store or indexing failed.
    async fn refresh_vector_cache(&self) -> Result<bool, DatabaseError>;

    async fn send_sms(
        &self,
        to: &str,
        message: &str,
        sender_id: &str,
    ) -> Result<bool, DatabaseError>;

    fn vector_store(&self) -> Option<Arc<VectorStore>>;
}

/// Open the backend named by `config.kind`.
pub async fn open_database(
    config: &DatabaseConfig,
    tables_dir: impl Into<PathBuf>,
    vector_store: Option<Arc<VectorStore>>,
) -> Result<Arc<dyn Database>, SvError> {
    let kind = config.kind()?;
    info!(backend = %kind, "Opening database");

    let db: Arc<dyn Database> = match kind {
        DatabaseKind::Text => Arc::new(TextDatabase::open(tables_dir, vector_store).await?),
        DatabaseKind::MySql => Arc::new(MySqlDatabase::new(config)),
    };
    Ok(db)
}
