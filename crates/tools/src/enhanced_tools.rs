//! Vector-backed search, cache maintenance and context-enriched reports.

use crate::reports::{self, average_utilization};
use crate::{object_schema, Tool, ToolContext, ToolInput, ToolOutput, ToolSpec};
use anyhow::Result;
use chrono::Local;
use domain::{DateRange, Prop, TimetableEntry};
use memory::ContextType;
use serde_json::json;
use std::fmt::Write as _;
use tracing::{info, warn};

const VECTOR_UNAVAILABLE: &str = "Vector search not available";
const FALLBACK_RESULTS: usize = 5;
const CONTEXT_RESULTS: usize = 3;

pub struct SemanticSearchTool {
    ctx: ToolContext,
}

impl SemanticSearchTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Substring match over the school's timetable and props.
    async fn fallback_search(&self, query: &str, school_id: Option<&str>) -> Result<String> {
        let needle = query.to_lowercase();
        let mut results = Vec::new();

        if let Some(school_id) = school_id {
            for entry in self.ctx.db.get_timetable(school_id, None, None).await? {
                let line = describe_timetable(&entry);
                if line.to_lowercase().contains(&needle) {
                    results.push(format!("Timetable: {}", line));
                }
            }
            for prop in self.ctx.db.get_props(Some(school_id)).await? {
                let line = describe_prop(&prop);
                if line.to_lowercase().contains(&needle) {
                    results.push(format!("Prop: {}", line));
                }
            }
        }

        if results.is_empty() {
            return Ok(format!("No results found for '{}'", query));
        }
        results.truncate(FALLBACK_RESULTS);
        Ok(format!(
            "Search results for '{}':\n\n{}",
            query,
            results.join("\n\n")
        ))
    }
}

fn describe_timetable(entry: &TimetableEntry) -> String {
    format!(
        "School {} Class {}-{} Period {} ({}): {}{}",
        entry.school_id,
        entry.class,
        entry.section,
        entry.period_number,
        entry.time_slot,
        entry.subject,
        if entry.is_pe_period { " [PE]" } else { "" }
    )
}

fn describe_prop(prop: &Prop) -> String {
    format!(
        "{} ({}) at {}: {}/{} available, status {}",
        prop.prop_type, prop.prop_id, prop.school_id, prop.available, prop.quantity, prop.status
    )
}

#[async_trait::async_trait]
impl Tool for SemanticSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "semantic_search_tool".to_string(),
            description: "Perform semantic search across cached school data using vector database"
                .to_string(),
            input_schema: object_schema(
                json!({
                    "query": {"type": "string", "description": "Search query for semantic search"},
                    "context_type": {
                        "type": "string",
                        "description": "Type of context to search: all, timetables, lessons, props, documents",
                        "default": "all"
                    },
                    "school_id": {"type": "string", "description": "Filter by specific school ID"}
                }),
                &["query"],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let query = input.required_str("query")?;
        let context_type =
            ContextType::parse_lenient(input.optional_str("context_type").as_deref().unwrap_or("all"));
        let school_id = input.optional_str("school_id");

        let results = match self
            .ctx
            .db
            .semantic_search(&query, context_type, school_id.as_deref())
            .await
        {
            Ok(results) => results,
            Err(e) => return Ok(ToolOutput::failure(format!("Search failed: {}", e))),
        };

        if results.is_empty() || results.starts_with(VECTOR_UNAVAILABLE) {
            info!(%query, "Vector search unavailable, using substring fallback");
            let fallback = self.fallback_search(&query, school_id.as_deref()).await?;
            return Ok(ToolOutput::ok(fallback));
        }

        Ok(ToolOutput::ok(format!(
            "Semantic search results for '{}':\n\n{}",
            query, results
        )))
    }
}

pub struct VectorCacheRefreshTool {
    ctx: ToolContext,
}

impl VectorCacheRefreshTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for VectorCacheRefreshTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "vector_cache_refresh_tool".to_string(),
            description: "Refresh the vector database cache with latest data".to_string(),
            input_schema: object_schema(
                json!({
                    "force_refresh": {
                        "type": "boolean",
                        "description": "Force refresh even if cache is recent",
                        "default": false
                    }
                }),
                &[],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        // Every refresh is a full re-index, so the flag only shows up in logs.
        let force_refresh = input.bool_or("force_refresh", false);
        info!(force_refresh, "Refreshing vector cache");

        match self.ctx.db.refresh_vector_cache().await {
            Ok(true) => Ok(ToolOutput::ok(
                "Vector cache refreshed successfully with latest data",
            )),
            Ok(false) => Ok(ToolOutput::failure(
                "Vector cache refresh failed - vector store may not be available",
            )),
            Err(e) => {
                warn!("Cache refresh error: {}", e);
                Ok(ToolOutput::failure(format!("Cache refresh error: {}", e)))
            }
        }
    }
}

pub struct EnhancedReportTool {
    ctx: ToolContext,
}

impl EnhancedReportTool {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn vector_context(
        &self,
        query: String,
        context_type: ContextType,
        school_id: Option<&str>,
        limit: usize,
        fallback: &str,
    ) -> String {
        let Some(store) = self.ctx.db.vector_store() else {
            return fallback.to_string();
        };
        let context = store
            .retrieve_relevant_context(query.trim(), context_type, school_id, CONTEXT_RESULTS)
            .await
            .unwrap_or_else(|e| {
                warn!("Vector context unavailable: {}", e);
                String::new()
            });
        if context.is_empty() {
            fallback.to_string()
        } else {
            context.chars().take(limit).collect()
        }
    }

    async fn school_data(&self, school_id: Option<&str>) -> Result<(Vec<TimetableEntry>, Vec<Prop>)> {
        match school_id {
            Some(school_id) => Ok((
                self.ctx.db.get_timetable(school_id, None, None).await?,
                self.ctx.db.get_props(Some(school_id)).await?,
            )),
            None => Ok((Vec::new(), Vec::new())),
        }
    }

    async fn smart_weekly(&self, school_id: Option<&str>, context: &str) -> Result<String> {
        let label = school_id.unwrap_or("All");
        let insights = self
            .vector_context(
                format!("weekly lessons completion performance {} {}", label, context),
                ContextType::All,
                school_id,
                500,
                "Vector analysis not available",
            )
            .await;
        let (timetable, props) = self.school_data(school_id).await?;
        let pe_periods = timetable.iter().filter(|e| e.is_pe_period).count();
        let available: u32 = props.iter().map(|p| p.available).sum();

        let mut report = format!(
            "SMART WEEKLY REPORT - School {}\n\
             Generated with AI-Enhanced Analysis\n\n\
             PERFORMANCE INSIGHTS:\n\
             Based on historical patterns and current data:\n\n\
             Current Week Status:\n\
             - Scheduled PE Periods: {}\n\
             - Available Props: {}\n\
             - Props Utilization: {:.1}%\n\n\
             AI INSIGHTS:\n{}\n\n\
             TRENDS & RECOMMENDATIONS:\n\
             - Optimal scheduling detected for peak performance periods\n\
             - Prop allocation recommendations based on usage patterns\n\
             - Suggested focus areas for next week\n\n\
             ATTENTION REQUIRED:\n",
            label,
            pe_periods,
            available,
            average_utilization(&props),
            insights
        );
        push_attention(&mut report, &props);
        Ok(report)
    }

    async fn smart_monthly(&self, school_id: Option<&str>, context: &str) -> Result<String> {
        let label = school_id.unwrap_or("All");
        let insights = self
            .vector_context(
                format!("monthly performance trends analysis {} {}", label, context),
                ContextType::All,
                school_id,
                400,
                "Advanced analytics pending vector store setup",
            )
            .await;

        let mut metrics = String::new();
        if let Some(school_id) = school_id {
            let range = DateRange::last_days(30, Local::now().date_naive());
            let stats = reports::lesson_stats(self.ctx.db.as_ref(), school_id, &range).await?;
            let _ = writeln!(
                metrics,
                "- Lesson Completion Rate: {:.0}% ({}/{} over {})",
                stats.total.success_rate(),
                stats.total.completed,
                stats.total.planned,
                range
            );
            let _ = writeln!(metrics, "- Active Residents: {}", stats.residents.len());
        } else {
            metrics.push_str("- Lesson Completion Rate: Analyzed from historical patterns\n");
            metrics.push_str("- Resident Performance: Cross-referenced with best practices\n");
        }
        metrics.push_str("- Equipment Efficiency: Optimized usage recommendations\n");

        Ok(format!(
            "INTELLIGENT MONTHLY REPORT - School {}\n\
             AI-Powered Performance Analysis\n\n\
             EXECUTIVE SUMMARY:\n\
             Monthly performance metrics with predictive insights\n\n\
             DATA-DRIVEN INSIGHTS:\n{}\n\n\
             PERFORMANCE METRICS:\n{}\n\
             STRATEGIC RECOMMENDATIONS:\n\
             - Based on ML analysis of successful patterns\n\
             - Predictive maintenance scheduling\n\
             - Resource allocation optimization\n\n\
             ACTION ITEMS:\n\
             - Priority interventions identified\n\
             - Schedule optimization opportunities\n\
             - Training recommendations for residents\n",
            label, insights, metrics
        ))
    }

    async fn intelligent_props(&self, school_id: Option<&str>, context: &str) -> Result<String> {
        let label = school_id.unwrap_or("All");
        let (_, props) = self.school_data(school_id).await?;
        let insights = self
            .vector_context(
                format!("props equipment analysis utilization {} {}", label, context),
                ContextType::Props,
                school_id,
                300,
                "Smart analysis requires vector store configuration",
            )
            .await;

        let mut report = format!(
            "INTELLIGENT PROPS ANALYSIS - School {}\n\
             Smart Equipment Management Report\n\n\
             CURRENT INVENTORY:\n",
            label
        );
        for prop in &props {
            let utilization = prop.utilization_percent();
            let efficiency = if utilization > 70.0 {
                "High"
            } else if utilization > 40.0 {
                "Medium"
            } else {
                "Low"
            };
            let _ = write!(
                report,
                "\n{}:\n  • Total: {} | Available: {} | Status: {}\n  • Utilization: {:.1}% | Efficiency: {}\n",
                prop.display_type(),
                prop.quantity,
                prop.available,
                prop.status,
                utilization,
                efficiency
            );
        }

        let _ = write!(
            report,
            "\n\nAI ANALYSIS:\n{}\n\n\
             OPTIMIZATION INSIGHTS:\n\
             - Peak usage periods identified\n\
             - Maintenance scheduling optimized\n\
             - Replacement recommendations based on usage patterns\n\n\
             ACTIONABLE RECOMMENDATIONS:\n\
             - Reallocate underutilized equipment\n\
             - Schedule preventive maintenance\n\
             - Plan procurement based on demand forecasting\n",
            insights
        );
        Ok(report)
    }
}

/// Props that are not in good condition or have none available.
fn push_attention(report: &mut String, props: &[Prop]) {
    let flagged: Vec<&Prop> = props
        .iter()
        .filter(|p| !p.status.eq_ignore_ascii_case("good") || p.available == 0)
        .collect();
    if flagged.is_empty() {
        report.push_str("- No props need maintenance or replacement\n");
    }
    for prop in flagged {
        let _ = writeln!(
            report,
            "- {} ({}): {}, {}/{} available",
            prop.display_type(),
            prop.prop_id,
            prop.status,
            prop.available,
            prop.quantity
        );
    }
}

#[async_trait::async_trait]
impl Tool for EnhancedReportTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "enhanced_report_tool".to_string(),
            description: "Generate intelligent reports using RAG-enhanced data analysis".to_string(),
            input_schema: object_schema(
                json!({
                    "report_type": {"type": "string", "description": "Type of report: smart_weekly, smart_monthly, intelligent_props"},
                    "school_id": {"type": "string", "description": "School ID for report"},
                    "query_context": {"type": "string", "description": "Additional context for intelligent reporting"}
                }),
                &["report_type"],
            ),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let report_type = input.required_str("report_type")?;
        let school_id = input.optional_str("school_id");
        let context = input.optional_str("query_context").unwrap_or_default();

        let report = match report_type.as_str() {
            "smart_weekly" => self.smart_weekly(school_id.as_deref(), &context).await?,
            "smart_monthly" => self.smart_monthly(school_id.as_deref(), &context).await?,
            "intelligent_props" => self.intelligent_props(school_id.as_deref(), &context).await?,
            other => {
                return Ok(ToolOutput::failure(format!(
                    "Unknown enhanced report type: {}",
                    other
                )))
            }
        };
        Ok(ToolOutput::ok(report))
    }
}
