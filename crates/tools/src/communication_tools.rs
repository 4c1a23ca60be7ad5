//! SMS notifications to Head Office and stakeholder reports.

use crate::reports;
use crate::{object_schema, Tool, ToolContext, ToolInput, ToolOutput, ToolSpec};
use anyhow::Result;
use chrono::Local;
use common::SmsConfig;
use domain::{format_sms, DateRange, SmsMessageType, DATE_FORMAT};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

/// Client for the SMS gateway. Without an endpoint and key every send is
/// simulated.
#[derive(Debug, Clone)]
pub struct SmsGateway {
    endpoint: Option<String>,
    api_key: Option<String>,
    client: Client,
}

impl SmsGateway {
    pub fn from_config(config: &SmsConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build SMS HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            endpoint: config.endpoint.clone().filter(|e| !e.is_empty()),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            client,
        }
    }

    pub fn simulated() -> Self {
        Self::from_config(&SmsConfig::default())
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }

    /// Send `message` with the prefix for `message_type`; returns a status
    /// line for the model.
    pub async fn send(&self, recipient: &str, message: &str, message_type: &str) -> String {
        let (Some(endpoint), Some(api_key)) = (&self.endpoint, &self.api_key) else {
            warn!("SMS configuration not found, simulating SMS send");
            return format!(
                "SMS simulated - Type: {}, To: {}, Message: {}",
                message_type, recipient, message
            );
        };

        let formatted = format_sms(SmsMessageType::parse_lenient(message_type), message);
        let payload = json!({
            "to": recipient,
            "message": formatted,
            "type": message_type,
        });

        let response = match self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Error sending SMS: {}", e);
                return format!("Error sending SMS: {}", e);
            }
        };

        let status = response.status();
        if status.as_u16() == 200 {
            info!(%recipient, "SMS sent successfully");
            format!("SMS sent successfully to {}", recipient)
        } else {
            let body = response.text().await.unwrap_or_default();
            error!("Failed to send SMS: {} - {}", status.as_u16(), body);
            format!("Failed to send SMS: {}", status.as_u16())
        }
    }
}

pub struct SmsSenderTool {
    ctx: ToolContext,
}

impl SmsSenderTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for SmsSenderTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "sms_sender_tool".to_string(),
            description: "Send SMS notifications to SV Head Office with standardized formats. \
                Formats: lesson_completion \"SC001|V-A|P3|L001|R001|2024-10-05|Notes\", \
                prop_update \"PROP001|damaged|R001|2024-10-05|Notes\", \
                absence \"R001|absent|2024-10-05|backup_R002|Notes\""
                .to_string(),
            input_schema: object_schema(
                json!({
                    "recipient": {"type": "string", "description": "Phone number or recipient identifier"},
                    "message": {"type": "string", "description": "Message content to send"},
                    "message_type": {"type": "string", "description": "Type of message (lesson_completion, prop_update, absence, etc.)"}
                }),
                &["recipient", "message", "message_type"],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let recipient = input.required_str("recipient")?;
        let message = input.required_str("message")?;
        let message_type = input.required_str("message_type")?;

        let result = self.ctx.sms.send(&recipient, &message, &message_type).await;
        let success = !result.starts_with("Failed") && !result.starts_with("Error");
        Ok(ToolOutput { success, result })
    }
}

pub struct ReportGeneratorTool {
    ctx: ToolContext,
}

impl ReportGeneratorTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn range_or(raw: Option<&str>, default_days: u32) -> Result<DateRange, String> {
        match raw {
            Some(raw) => raw
                .parse::<DateRange>()
                .map_err(|e| format!("Invalid date range '{}': {}", raw, e)),
            None => Ok(DateRange::last_days(default_days, Local::now().date_naive())),
        }
    }
}

#[async_trait::async_trait]
impl Tool for ReportGeneratorTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "report_generator_tool".to_string(),
            description: "Generate reports for different stakeholders based on data queries"
                .to_string(),
            input_schema: object_schema(
                json!({
                    "report_type": {"type": "string", "description": "Type of report to generate (weekly_lessons, monthly_lessons, prop_status, resident_activity)"},
                    "school_id": {"type": "string", "description": "School ID to filter report"},
                    "date_range": {"type": "string", "description": "Date range for report, YYYY-MM-DD..YYYY-MM-DD"},
                    "manager_id": {"type": "string", "description": "Manager ID to filter report; all residents when omitted"}
                }),
                &["report_type"],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let report_type = input.required_str("report_type")?;
        let school_id = input.optional_str("school_id");
        let date_range = input.optional_str("date_range");
        let db = self.ctx.db.as_ref();

        let report = match report_type.as_str() {
            "weekly_lessons" | "monthly_lessons" => {
                let Some(school_id) = school_id else {
                    return Ok(ToolOutput::failure(format!(
                        "school_id is required for {} reports",
                        report_type
                    )));
                };
                let weekly = report_type == "weekly_lessons";
                let range = match Self::range_or(date_range.as_deref(), if weekly { 7 } else { 30 }) {
                    Ok(range) => range,
                    Err(message) => return Ok(ToolOutput::failure(message)),
                };

                let stats = reports::lesson_stats(db, &school_id, &range).await?;
                if weekly {
                    reports::weekly_lessons(&school_id, &range, &stats)
                } else {
                    let props = db.get_props(Some(&school_id)).await?;
                    reports::monthly_lessons(&school_id, &range, &stats, &props)
                }
            }
            "prop_status" => {
                let props = db.get_props(school_id.as_deref()).await?;
                let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
                reports::prop_status(school_id.as_deref().unwrap_or("All"), &today, &props)
            }
            "resident_activity" => {
                let manager_id = input.optional_str("manager_id");
                let range = match Self::range_or(date_range.as_deref(), 30) {
                    Ok(range) => range,
                    Err(message) => return Ok(ToolOutput::failure(message)),
                };
                reports::resident_activity(db, manager_id.as_deref(), &range).await?
            }
            other => {
                return Ok(ToolOutput::failure(format!("Unknown report type: {}", other)));
            }
        };

        info!(%report_type, "Report generated");
        Ok(ToolOutput::ok(report))
    }
}
