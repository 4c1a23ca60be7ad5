use crate::interface::Database;
use crate::table::{append_row, read_table, Record};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use common::{DatabaseError, OperationTimer};
use domain::{
    parse_date, DateRange, Event, Lesson, LessonCompletion, LessonPlan, Prop, PropUpdate,
    TimetableEntry, User, UserRole,
};
use memory::{ContextType, VectorStore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

const COMPLETIONS_TABLE: &str = "lesson_completions";
const COMPLETIONS_HEADER: [&str; 9] = [
    "school_id",
    "class",
    "section",
    "period_number",
    "lesson_id",
    "resident_id",
    "date",
    "notes",
    "timestamp",
];

const PROP_UPDATES_TABLE: &str = "prop_updates";
const PROP_UPDATES_HEADER: [&str; 5] = ["timestamp", "prop_id", "status", "resident_id", "notes"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const SEARCH_RESULTS: usize = 5;

/// Activity written during this process lifetime, seeded from the runtime
/// tables on open.
#[derive(Default)]
struct RuntimeLog {
    completions: Vec<LessonCompletion>,
    prop_updates: Vec<PropUpdate>,
}

/// Development backend over pipe-separated text tables.
///
/// Reference tables are re-read on every call so hand edits show up without
/// a restart. Lesson completions and prop updates are appended to their own
/// tables and mirrored in memory.
pub struct TextDatabase {
    tables_dir: PathBuf,
    vector_store: Option<Arc<VectorStore>>,
    runtime: Mutex<RuntimeLog>,
}

impl TextDatabase {
    pub async fn open(
        tables_dir: impl Into<PathBuf>,
        vector_store: Option<Arc<VectorStore>>,
    ) -> Result<Self, DatabaseError> {
        let tables_dir = tables_dir.into();
        if !tables_dir.is_dir() {
            warn!(dir = %tables_dir.display(), "Tables directory does not exist");
        }

        let completions = convert_rows(
            read_table(&tables_dir, COMPLETIONS_TABLE).await?,
            completion_from,
        );
        let prop_updates = convert_rows(
            read_table(&tables_dir, PROP_UPDATES_TABLE).await?,
            prop_update_from,
        );

        info!(
            dir = %tables_dir.display(),
            completions = completions.len(),
            prop_updates = prop_updates.len(),
            vector_search = vector_store.is_some(),
            "TextDatabase initialized"
        );

        Ok(Self {
            tables_dir,
            vector_store,
            runtime: Mutex::new(RuntimeLog {
                completions,
                prop_updates,
            }),
        })
    }

    pub fn tables_dir(&self) -> &Path {
        &self.tables_dir
    }

    async fn users(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(convert_rows(read_table(&self.tables_dir, "users").await?, user_from))
    }

    async fn timetables(&self) -> Result<Vec<TimetableEntry>, DatabaseError> {
        Ok(convert_rows(
            read_table(&self.tables_dir, "timetables").await?,
            timetable_from,
        ))
    }

    async fn all_lesson_plans(&self) -> Result<Vec<LessonPlan>, DatabaseError> {
        Ok(convert_rows(
            read_table(&self.tables_dir, "lesson_plans").await?,
            lesson_plan_from,
        ))
    }

    async fn all_lessons(&self) -> Result<Vec<Lesson>, DatabaseError> {
        Ok(convert_rows(read_table(&self.tables_dir, "lessons").await?, lesson_from))
    }

    async fn reindex(&self, store: &VectorStore) -> Result<(), DatabaseError> {
        let timetables = self.timetables().await?;
        let lessons = self.all_lessons().await?;
        let plans = self.all_lesson_plans().await?;
        let props = self.get_props(None).await?;

        if !timetables.is_empty() {
            store.index_timetables(&timetables).await?;
        }
        if !lessons.is_empty() || !plans.is_empty() {
            store.index_lessons(&lessons, &plans).await?;
        }
        if !props.is_empty() {
            store.index_props(&props).await?;
        }
        store.persist().await?;
        Ok(())
    }
}

#[async_trait]
impl Database for TextDatabase {
    fn backend_name(&self) -> &'static str {
        "text"
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users().await?.into_iter().find(|u| u.user_id == user_id))
    }

    async fn authenticate_user(
        &self,
        user_id: &str,
        _password: &str,
    ) -> Result<Option<User>, DatabaseError> {
        // Development backend: any password is accepted for a known user.
        let user = self.get_user(user_id).await?;
        match &user {
            Some(_) => info!(user_id, "Mock authentication successful"),
            None => warn!(user_id, "User not found"),
        }
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        self.users().await
    }

    async fn get_timetable(
        &self,
        school_id: &str,
        class_name: Option<&str>,
        section: Option<&str>,
    ) -> Result<Vec<TimetableEntry>, DatabaseError> {
        Ok(self
            .timetables()
            .await?
            .into_iter()
            .filter(|tt| tt.school_id == school_id)
            .filter(|tt| class_name.map_or(true, |c| tt.class == c))
            .filter(|tt| section.map_or(true, |s| tt.section == s))
            .collect())
    }

    async fn get_lesson_plans(&self, school_id: &str) -> Result<Vec<LessonPlan>, DatabaseError> {
        Ok(self
            .all_lesson_plans()
            .await?
            .into_iter()
            .filter(|lp| lp.school_id == school_id)
            .collect())
    }

    async fn get_lessons(&self, lesson_plan_id: Option<&str>) -> Result<Vec<Lesson>, DatabaseError> {
        let lessons = self.all_lessons().await?;
        let Some(plan_id) = lesson_plan_id else {
            return Ok(lessons);
        };

        let plans = self.all_lesson_plans().await?;
        let Some(plan) = plans.iter().find(|lp| lp.lesson_plan_id == plan_id) else {
            return Ok(Vec::new());
        };
        Ok(lessons
            .into_iter()
            .filter(|lesson| plan.lessons.contains(&lesson.lesson_id))
            .collect())
    }

    async fn get_props(&self, school_id: Option<&str>) -> Result<Vec<Prop>, DatabaseError> {
        let mut props: Vec<Prop> = convert_rows(read_table(&self.tables_dir, "props").await?, prop_from)
            .into_iter()
            .filter(|p| school_id.map_or(true, |s| p.school_id == s))
            .collect();

        // The newest recorded update wins over the inventory file.
        let runtime = self.runtime.lock().await;
        let mut latest: HashMap<&str, &PropUpdate> = HashMap::new();
        for update in &runtime.prop_updates {
            match latest.get(update.prop_id.as_str()) {
                Some(seen) if seen.timestamp > update.timestamp => {}
                _ => {
                    latest.insert(update.prop_id.as_str(), update);
                }
            }
        }
        for prop in &mut props {
            if let Some(update) = latest.get(prop.prop_id.as_str()) {
                prop.status = update.status.clone();
            }
        }
        Ok(props)
    }

    async fn get_events(
        &self,
        school_id: &str,
        date_range: Option<&DateRange>,
    ) -> Result<Vec<Event>, DatabaseError> {
        Ok(convert_rows(read_table(&self.tables_dir, "events").await?, event_from)
            .into_iter()
            .filter(|e| e.school_id == school_id)
            .filter(|e| date_range.map_or(true, |r| r.contains(e.date)))
            .collect())
    }

    async fn log_lesson_completion(
        &self,
        mut completion: LessonCompletion,
    ) -> Result<bool, DatabaseError> {
        let timestamp = *completion
            .timestamp
            .get_or_insert_with(|| Local::now().naive_local());

        let mut runtime = self.runtime.lock().await;
        append_row(
            &self.tables_dir,
            COMPLETIONS_TABLE,
            &COMPLETIONS_HEADER,
            &[
                completion.school_id.clone(),
                completion.class.clone(),
                completion.section.clone(),
                completion.period_number.to_string(),
                completion.lesson_id.clone(),
                completion.resident_id.clone(),
                completion.date.format(domain::DATE_FORMAT).to_string(),
                completion.notes.clone().unwrap_or_default(),
                timestamp.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )
        .await?;

        info!(
            lesson_id = %completion.lesson_id,
            resident_id = %completion.resident_id,
            "Lesson completion logged"
        );
        runtime.completions.push(completion);
        Ok(true)
    }

    async fn update_prop_status(
        &self,
        prop_id: &str,
        status: &str,
        resident_id: &str,
        notes: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let known = convert_rows(read_table(&self.tables_dir, "props").await?, prop_from)
            .iter()
            .any(|p| p.prop_id == prop_id);
        if !known {
            warn!(prop_id, "Prop status update for unknown prop");
            return Ok(false);
        }

        let update = PropUpdate {
            prop_id: prop_id.to_string(),
            status: status.to_string(),
            resident_id: resident_id.to_string(),
            notes: notes.filter(|n| !n.is_empty()).map(String::from),
            timestamp: Local::now().naive_local(),
        };

        let mut runtime = self.runtime.lock().await;
        append_row(
            &self.tables_dir,
            PROP_UPDATES_TABLE,
            &PROP_UPDATES_HEADER,
            &[
                update.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                update.prop_id.clone(),
                update.status.clone(),
                update.resident_id.clone(),
                update.notes.clone().unwrap_or_default(),
            ],
        )
        .await?;

        info!(prop_id, status, "Prop status updated");
        runtime.prop_updates.push(update);
        Ok(true)
    }

    async fn get_residents_under_manager(
        &self,
        manager_id: &str,
    ) -> Result<Vec<User>, DatabaseError> {
        Ok(self
            .users()
            .await?
            .into_iter()
            .filter(|u| u.reports_to.as_deref() == Some(manager_id))
            .collect())
    }

    async fn get_lesson_completions(
        &self,
        school_id: Option<&str>,
        date_range: Option<&DateRange>,
    ) -> Result<Vec<LessonCompletion>, DatabaseError> {
        let runtime = self.runtime.lock().await;
        Ok(runtime
            .completions
            .iter()
            .filter(|c| school_id.map_or(true, |s| c.school_id == s))
            .filter(|c| date_range.map_or(true, |r| r.contains(c.date)))
            .cloned()
            .collect())
    }

    async fn get_prop_updates(
        &self,
        resident_id: Option<&str>,
    ) -> Result<Vec<PropUpdate>, DatabaseError> {
        let runtime = self.runtime.lock().await;
        Ok(runtime
            .prop_updates
            .iter()
            .filter(|u| resident_id.map_or(true, |r| u.resident_id == r))
            .cloned()
            .collect())
    }

    async fn semantic_search(
        &self,
        query: &str,
        context_type: ContextType,
        school_id: Option<&str>,
    ) -> Result<String, DatabaseError> {
        let Some(store) = &self.vector_store else {
            return Ok("Vector search not available".to_string());
        };

        match store
            .search_in(query, context_type, school_id, SEARCH_RESULTS)
            .await
        {
            Ok(hits) if hits.is_empty() => Ok(format!("No results found for '{}'", query)),
            Ok(hits) => {
                let documents: Vec<&str> = hits.iter().map(|h| h.document.as_str()).collect();
                Ok(format!(
                    "Search results for '{}':\n{}",
                    query,
                    documents.join("\n")
                ))
            }
            Err(e) => {
                error!("Vector search error: {}", e);
                Ok(format!("Search error: {}", e))
            }
        }
    }

    async fn refresh_vector_cache(&self) -> Result<bool, DatabaseError> {
        let Some(store) = &self.vector_store else {
            return Ok(false);
        };

        let timer = OperationTimer::new("refresh_vector_cache");
        let result = self.reindex(store).await;
        timer.finish_with_result(&result);
        match result {
            Ok(()) => {
                info!("Vector cache refreshed successfully");
                Ok(true)
            }
            Err(e) => {
                error!("Vector cache refresh failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn send_sms(
        &self,
        to: &str,
        message: &str,
        sender_id: &str,
    ) -> Result<bool, DatabaseError> {
        info!(to, sender_id, "SMS sent (mock): {}", message);
        Ok(true)
    }

    fn vector_store(&self) -> Option<Arc<VectorStore>> {
        self.vector_store.clone()
    }
}

/// Convert each record, logging and skipping the ones that do not fit.
fn convert_rows<T>(
    records: Vec<Record>,
    convert: impl Fn(&Record) -> Result<T, DatabaseError>,
) -> Vec<T> {
    records
        .iter()
        .filter_map(|record| match convert(record) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Skipping row: {}", e);
                None
            }
        })
        .collect()
}

fn user_from(r: &Record) -> Result<User, DatabaseError> {
    let role: UserRole = r
        .text("role")
        .parse()
        .map_err(|e: domain::DomainError| r.invalid(e.to_string()))?;
    Ok(User {
        user_id: r.text("user_id"),
        password: r.text("password"),
        role,
        name: r.text("name"),
        school_id: r.optional("school_id"),
        reports_to: r.optional("reports_to"),
    })
}

fn timetable_from(r: &Record) -> Result<TimetableEntry, DatabaseError> {
    Ok(TimetableEntry {
        school_id: r.text("school_id"),
        class: r.text("class"),
        section: r.text("section"),
        period_number: r.number("period_number")?,
        time_slot: r.text("time_slot"),
        subject: r.text("subject"),
        is_pe_period: r.flag("is_pe_period"),
    })
}

fn lesson_plan_from(r: &Record) -> Result<LessonPlan, DatabaseError> {
    Ok(LessonPlan {
        lesson_plan_id: r.text("lesson_plan_id"),
        school_id: r.text("school_id"),
        session: r.text("session"),
        lessons: r.list("lessons"),
    })
}

fn lesson_from(r: &Record) -> Result<Lesson, DatabaseError> {
    Ok(Lesson {
        lesson_id: r.text("lesson_id"),
        name: r.text("name"),
        description: r.text("description"),
        duration: r.number("duration")?,
        required_props: r.list("required_props"),
    })
}

fn prop_from(r: &Record) -> Result<Prop, DatabaseError> {
    Ok(Prop {
        prop_id: r.text("prop_id"),
        prop_type: r.text("type"),
        school_id: r.text("school_id"),
        quantity: r.number("quantity")?,
        available: r.number("available")?,
        status: r.text("status"),
    })
}

fn event_from(r: &Record) -> Result<Event, DatabaseError> {
    Ok(Event {
        event_id: r.text("event_id"),
        school_id: r.text("school_id"),
        name: r.text("name"),
        date: parse_date(&r.text("date")).map_err(|e| r.invalid(e.to_string()))?,
        description: r.optional("description"),
    })
}

fn completion_from(r: &Record) -> Result<LessonCompletion, DatabaseError> {
    Ok(LessonCompletion {
        school_id: r.text("school_id"),
        class: r.text("class"),
        section: r.text("section"),
        period_number: r.number("period_number")?,
        lesson_id: r.text("lesson_id"),
        resident_id: r.text("resident_id"),
        date: parse_date(&r.text("date")).map_err(|e| r.invalid(e.to_string()))?,
        notes: r.optional("notes"),
        timestamp: r.optional("timestamp").and_then(|t| t.parse().ok()),
    })
}

fn prop_update_from(r: &Record) -> Result<PropUpdate, DatabaseError> {
    let raw = r.text("timestamp");
    let timestamp: NaiveDateTime = raw
        .parse()
        .map_err(|_| r.invalid(format!("bad timestamp {:?}", raw)))?;
    Ok(PropUpdate {
        prop_id: r.text("prop_id"),
        status: r.text("status"),
        resident_id: r.text("resident_id"),
        notes: r.optional("notes"),
        timestamp,
    })
}
