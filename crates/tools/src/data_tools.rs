//! Read and write access to school operational data.

use crate::{object_schema, Tool, ToolContext, ToolInput, ToolOutput, ToolSpec};
use anyhow::Result;
use chrono::Local;
use domain::{format_sms, parse_date, LessonCompletion, SmsBody, SmsMessageType, DATE_FORMAT};
use memory::DocType;
use serde_json::json;
use std::fmt::Write as _;
use tracing::info;

pub struct TimetableTool {
    ctx: ToolContext,
}

impl TimetableTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for TimetableTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "timetable_tool".to_string(),
            description: "Get timetable information for a specific school, class, and section"
                .to_string(),
            input_schema: object_schema(
                json!({
                    "school_id": {"type": "string", "description": "School ID to query timetable for"},
                    "class_name": {"type": "string", "description": "Specific class to filter"},
                    "section": {"type": "string", "description": "Specific section to filter"}
                }),
                &["school_id"],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let school_id = input.required_str("school_id")?;
        let class_name = input.optional_str("class_name");
        let section = input.optional_str("section");

        let timetable = self
            .ctx
            .db
            .get_timetable(&school_id, class_name.as_deref(), section.as_deref())
            .await?;

        if timetable.is_empty() {
            return Ok(ToolOutput::ok(format!(
                "No timetable found for school {}",
                school_id
            )));
        }

        let mut result = format!("Timetable for School {}", school_id);
        if let Some(class_name) = &class_name {
            let _ = write!(result, ", Class {}", class_name);
        }
        if let Some(section) = &section {
            let _ = write!(result, ", Section {}", section);
        }
        result.push_str(":\n\n");

        for entry in &timetable {
            let _ = writeln!(
                result,
                "Period {} ({}): {}",
                entry.period_number, entry.time_slot, entry.subject
            );
        }

        Ok(ToolOutput::ok(result))
    }
}

pub struct LessonPlanTool {
    ctx: ToolContext,
}

impl LessonPlanTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for LessonPlanTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "lesson_plan_tool".to_string(),
            description: "Get lesson plans and lessons for a specific school".to_string(),
            input_schema: object_schema(
                json!({
                    "school_id": {"type": "string", "description": "School ID to query lesson plans for"}
                }),
                &["school_id"],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let school_id = input.required_str("school_id")?;
        let plans = self.ctx.db.get_lesson_plans(&school_id).await?;

        if plans.is_empty() {
            return Ok(ToolOutput::ok(format!(
                "No lesson plans found for school {}",
                school_id
            )));
        }

        let mut result = format!("Lesson Plans for School {}:\n\n", school_id);
        for plan in &plans {
            let _ = writeln!(
                result,
                "Lesson Plan {} (Session: {}):",
                plan.lesson_plan_id, plan.session
            );
            let lessons = self.ctx.db.get_lessons(Some(&plan.lesson_plan_id)).await?;
            for lesson in &lessons {
                let _ = writeln!(result, "  - {}: {}", lesson.name, lesson.description);
                let _ = writeln!(result, "    Duration: {} minutes", lesson.duration);
                let _ = writeln!(
                    result,
                    "    Required Props: {}\n",
                    lesson.required_props.join(", ")
                );
            }
        }

        Ok(ToolOutput::ok(result))
    }
}

pub struct PropsTool {
    ctx: ToolContext,
}

impl PropsTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for PropsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "props_tool".to_string(),
            description: "Get props inventory and status for a specific school".to_string(),
            input_schema: object_schema(
                json!({
                    "school_id": {"type": "string", "description": "School ID to query props for"}
                }),
                &["school_id"],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let school_id = input.required_str("school_id")?;
        let props = self.ctx.db.get_props(Some(&school_id)).await?;

        if props.is_empty() {
            return Ok(ToolOutput::ok(format!(
                "No props found for school {}",
                school_id
            )));
        }

        let mut result = format!("Props Inventory for School {}:\n\n", school_id);
        for prop in &props {
            let _ = writeln!(
                result,
                "{}: {}/{} available",
                prop.display_type(),
                prop.available,
                prop.quantity
            );
            let _ = writeln!(result, "  Status: {}", prop.status);
            let _ = writeln!(result, "  ID: {}\n", prop.prop_id);
        }

        Ok(ToolOutput::ok(result))
    }
}

pub struct ResidentsTool {
    ctx: ToolContext,
}

impl ResidentsTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for ResidentsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "residents_tool".to_string(),
            description: "Get list of residents under a specific manager".to_string(),
            input_schema: object_schema(
                json!({
                    "manager_id": {"type": "string", "description": "Manager ID to query residents for"}
                }),
                &["manager_id"],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let manager_id = input.required_str("manager_id")?;
        let residents = self.ctx.db.get_residents_under_manager(&manager_id).await?;

        if residents.is_empty() {
            return Ok(ToolOutput::ok(format!(
                "No residents found under manager {}",
                manager_id
            )));
        }

        let mut result = format!("Residents under Manager {}:\n\n", manager_id);
        for resident in &residents {
            let _ = writeln!(result, "- {} (ID: {})", resident.name, resident.user_id);
            if let Some(school_id) = &resident.school_id {
                let _ = writeln!(result, "  Assigned to School: {}", school_id);
            }
        }

        Ok(ToolOutput::ok(result))
    }
}

pub struct LessonCompletionTool {
    ctx: ToolContext,
}

impl LessonCompletionTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for LessonCompletionTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "lesson_completion_tool".to_string(),
            description: "Log completion of a lesson by a resident".to_string(),
            input_schema: object_schema(
                json!({
                    "school_id": {"type": "string", "description": "School ID"},
                    "class_name": {"type": "string", "description": "Class name"},
                    "section": {"type": "string", "description": "Section"},
                    "period_number": {"type": "integer", "description": "Period number"},
                    "lesson_id": {"type": "string", "description": "Lesson ID completed"},
                    "resident_id": {"type": "string", "description": "Resident who conducted the lesson"},
                    "date": {"type": "string", "description": "Date of lesson completion (YYYY-MM-DD)"},
                    "notes": {"type": "string", "description": "Additional notes"}
                }),
                &[
                    "school_id",
                    "class_name",
                    "section",
                    "period_number",
                    "lesson_id",
                    "resident_id",
                    "date",
                ],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let class_name = input.required_str("class_name")?;
        let section = input.required_str("section")?;
        let period_number = input.required_u32("period_number")?;
        let resident_id = input.required_str("resident_id")?;
        let raw_date = input.required_str("date")?;
        let date = match parse_date(&raw_date) {
            Ok(date) => date,
            Err(e) => return Ok(ToolOutput::failure(format!("{} (expected YYYY-MM-DD)", e))),
        };

        let completion = LessonCompletion {
            school_id: input.required_str("school_id")?,
            class: class_name.clone(),
            section: section.clone(),
            period_number,
            lesson_id: input.required_str("lesson_id")?,
            resident_id: resident_id.clone(),
            date,
            notes: input.optional_str("notes"),
            timestamp: None,
        };

        let sms_date = completion.date.format(DATE_FORMAT).to_string();
        let notification = ho_notification(
            SmsMessageType::LessonCompletion,
            SmsBody::lesson_completion(
                &completion.school_id,
                &completion.class,
                &completion.section,
                completion.period_number,
                &completion.lesson_id,
                &completion.resident_id,
                &sms_date,
                completion.notes.as_deref(),
            ),
        );

        let context = self
            .ctx
            .documentation(
                "lesson completion process standards quality requirements",
                Some(DocType::Processes),
                3,
            )
            .await;

        if !self.ctx.db.log_lesson_completion(completion).await? {
            return Ok(ToolOutput::failure("Failed to log lesson completion"));
        }
        info!(%resident_id, %class_name, %section, period_number, "Lesson completion logged");

        let mut result = format!(
            "Successfully logged lesson completion for {}-{} Period {} by {}\n{}",
            class_name, section, period_number, resident_id, notification
        );

        if !context.is_empty() {
            let lower = context.to_lowercase();
            result.push_str("\n\n--- SV Process Compliance ---\n");
            result.push_str("Please ensure the following SV standards are met:\n");
            if lower.contains("sms format") {
                result.push_str("• Send SMS notification to HO using standard format\n");
            }
            if lower.contains("quality") {
                result.push_str("• Verify lesson objectives were achieved\n");
            }
            if lower.contains("prop") {
                result.push_str("• Update any prop usage or issues\n");
            }
            result.push_str("• Complete logging within 2 hours of lesson completion");
        }

        Ok(ToolOutput::ok(result))
    }
}

pub struct PropUpdateTool {
    ctx: ToolContext,
}

impl PropUpdateTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for PropUpdateTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "prop_update_tool".to_string(),
            description: "Update prop status and condition".to_string(),
            input_schema: object_schema(
                json!({
                    "prop_id": {"type": "string", "description": "Prop ID to update"},
                    "status": {"type": "string", "description": "New status (good, damaged, missing, etc.)"},
                    "resident_id": {"type": "string", "description": "Resident making the update"},
                    "notes": {"type": "string", "description": "Additional notes"}
                }),
                &["prop_id", "status", "resident_id"],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let prop_id = input.required_str("prop_id")?;
        let status = input.required_str("status")?;
        let resident_id = input.required_str("resident_id")?;
        let notes = input.optional_str("notes");

        let context = self
            .ctx
            .documentation(
                "prop management equipment status reporting standards",
                Some(DocType::Processes),
                3,
            )
            .await;

        let updated = self
            .ctx
            .db
            .update_prop_status(&prop_id, &status, &resident_id, notes.as_deref())
            .await?;
        if !updated {
            return Ok(ToolOutput::failure(format!("Failed to update prop {}", prop_id)));
        }

        let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
        let notification = ho_notification(
            SmsMessageType::PropUpdate,
            SmsBody::prop_update(&prop_id, &status, &resident_id, &today, notes.as_deref()),
        );
        let mut result = format!(
            "Successfully updated prop {} status to {}\n{}",
            prop_id, status, notification
        );
        if !context.is_empty() {
            result.push_str("\n\n--- SV Prop Management Guidelines ---\n");
            match status.to_lowercase().as_str() {
                "damaged" => result.push_str(
                    "• Remove from active inventory immediately\n\
                     • Report to school administration\n\
                     • Schedule repair or replacement",
                ),
                "missing" => result.push_str(
                    "• Escalate to school administration immediately\n\
                     • Investigate last known usage\n\
                     • File incident report",
                ),
                "good" => result.push_str(
                    "• Return to active inventory\n\
                     • Update utilization metrics",
                ),
                _ => {}
            }
            result.push_str("\n• Update weekly prop report\n");
            result.push_str("• Notify Regional Manager if significant issue");
        }

        Ok(ToolOutput::ok(result))
    }
}

/// The ready-to-send Head Office SMS for a logged activity.
fn ho_notification(kind: SmsMessageType, body: String) -> String {
    format!("HO notification: {}", format_sms(kind, &body))
}
