use crate::interface::Database;
use async_trait::async_trait;
use common::{DatabaseConfig, DatabaseError};
use domain::{
    DateRange, Event, Lesson, LessonCompletion, LessonPlan, Prop, PropUpdate, TimetableEntry, User,
};
use memory::{ContextType, VectorStore};
use std::sync::Arc;
use tracing::info;

const PENDING: &str = "MySQL implementation pending";

/// Production backend placeholder. Connection settings are carried so the
/// factory and configuration can be exercised end to end.
pub struct MySqlDatabase {
    host: String,
    port: u16,
    user: String,
    #[allow(dead_code)]
    password: String,
    database: String,
}

impl MySqlDatabase {
    pub fn new(config: &DatabaseConfig) -> Self {
        info!(
            host = %config.mysql_host,
            port = config.mysql_port,
            database = %config.mysql_database,
            "MySQL backend selected"
        );
        Self {
            host: config.mysql_host.clone(),
            port: config.mysql_port,
            user: config.mysql_user.clone(),
            password: config.mysql_password.clone(),
            database: config.mysql_database.clone(),
        }
    }

    /// `user@host:port/database`
    pub fn connection_label(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

fn pending<T>() -> Result<T, DatabaseError> {
    Err(DatabaseError::NotImplemented(PENDING.to_string()))
}

#[async_trait]
impl Database for MySqlDatabase {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    async fn get_user(&self, _user_id: &str) -> Result<Option<User>, DatabaseError> {
        pending()
    }

    async fn authenticate_user(
        &self,
        _user_id: &str,
        _password: &str,
    ) -> Result<Option<User>, DatabaseError> {
        pending()
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        pending()
    }

    async fn get_timetable(
        &self,
        _school_id: &str,
        _class_name: Option<&str>,
        _section: Option<&str>,
    ) -> Result<Vec<TimetableEntry>, DatabaseError> {
        pending()
    }

    async fn get_lesson_plans(&self, _school_id: &str) -> Result<Vec<LessonPlan>, DatabaseError> {
        pending()
    }

    async fn get_lessons(&self, _lesson_plan_id: Option<&str>) -> Result<Vec<Lesson>, DatabaseError> {
        pending()
    }

    async fn get_props(&self, _school_id: Option<&str>) -> Result<Vec<Prop>, DatabaseError> {
        pending()
    }

    async fn get_events(
        &self,
        _school_id: &str,
        _date_range: Option<&DateRange>,
    ) -> Result<Vec<Event>, DatabaseError> {
        pending()
    }

    async fn log_lesson_completion(
        &self,
        _completion: LessonCompletion,
    ) -> Result<bool, DatabaseError> {
        pending()
    }

    async fn update_prop_status(
        &self,
        _prop_id: &str,
        _status: &str,
        _resident_id: &str,
        _notes: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        pending()
    }

    async fn get_residents_under_manager(
        &self,
        _manager_id: &str,
    ) -> Result<Vec<User>, DatabaseError> {
        pending()
    }

    async fn get_lesson_completions(
        &self,
        _school_id: Option<&str>,
        _date_range: Option<&DateRange>,
    ) -> Result<Vec<LessonCompletion>, DatabaseError> {
        pending()
    }

    async fn get_prop_updates(
        &self,
        _resident_id: Option<&str>,
    ) -> Result<Vec<PropUpdate>, DatabaseError> {
        pending()
    }

    async fn semantic_search(
        &self,
        _query: &str,
        _context_type: ContextType,
        _school_id: Option<&str>,
    ) -> Result<String, DatabaseError> {
        pending()
    }

    async fn refresh_vector_cache(&self) -> Result<bool, DatabaseError> {
        pending()
    }

    async fn send_sms(
        &self,
        _to: &str,
        _message: &str,
        _sender_id: &str,
    ) -> Result<bool, DatabaseError> {
        pending()
    }

    fn vector_store(&self) -> Option<Arc<VectorStore>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_operation_reports_pending() {
        let db = MySqlDatabase::new(&DatabaseConfig::default());
        assert_eq!(db.connection_label(), "root@localhost:3306/sportzvillage");

        let err = db.get_user("R001").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotImplemented(ref m) if m == PENDING));
        assert!(db.get_props(None).await.is_err());
        assert!(db.refresh_vector_cache().await.is_err());
        assert!(db.vector_store().is_none());
    }
}
