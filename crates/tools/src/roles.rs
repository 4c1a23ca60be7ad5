//! Which tools each role may use.
//!
//! Every role can read schedules, lessons and props and consult the
//! documentation. Residents log field work; managers and head office report.

use crate::{
    EnhancedReportTool, LessonCompletionTool, LessonPlanTool, PropUpdateTool, PropsTool,
    ReportGeneratorTool, ResidentsTool, SemanticSearchTool, SmsSenderTool, SvDocumentationTool,
    SvProcessGuideTool, TimetableTool, Tool, ToolContext, ToolRegistry, VectorCacheRefreshTool,
};
use domain::UserRole;

const BASE_TOOLS: [&str; 6] = [
    "timetable_tool",
    "lesson_plan_tool",
    "props_tool",
    "semantic_search_tool",
    "sv_documentation_tool",
    "sv_process_guide_tool",
];

const RESIDENT_TOOLS: [&str; 3] = ["lesson_completion_tool", "prop_update_tool", "sms_sender_tool"];

const MANAGER_TOOLS: [&str; 4] = [
    "residents_tool",
    "report_generator_tool",
    "enhanced_report_tool",
    "vector_cache_refresh_tool",
];

const HEAD_OFFICE_TOOLS: [&str; 3] = [
    "report_generator_tool",
    "enhanced_report_tool",
    "vector_cache_refresh_tool",
];

/// Tool names for `role`, base tools first, without duplicates.
pub fn tool_names_for_role(role: UserRole) -> Vec<&'static str> {
    let extra: &[&str] = match role {
        UserRole::Resident => &RESIDENT_TOOLS,
        UserRole::DeliveryManager | UserRole::DeliveryLead | UserRole::RegionalManager => {
            &MANAGER_TOOLS
        }
        UserRole::HeadOffice => &HEAD_OFFICE_TOOLS,
        UserRole::Principal => &[],
    };

    let mut names: Vec<&'static str> = BASE_TOOLS.to_vec();
    for name in extra {
        if !names.contains(name) {
            names.push(*name);
        }
    }
    names
}

fn build_tool(name: &str, ctx: &ToolContext) -> Option<Box<dyn Tool>> {
    let ctx = ctx.clone();
    let tool: Box<dyn Tool> = match name {
        "timetable_tool" => Box::new(TimetableTool::new(ctx)),
        "lesson_plan_tool" => Box::new(LessonPlanTool::new(ctx)),
        "props_tool" => Box::new(PropsTool::new(ctx)),
        "residents_tool" => Box::new(ResidentsTool::new(ctx)),
        "lesson_completion_tool" => Box::new(LessonCompletionTool::new(ctx)),
        "prop_update_tool" => Box::new(PropUpdateTool::new(ctx)),
        "sms_sender_tool" => Box::new(SmsSenderTool::new(ctx)),
        "report_generator_tool" => Box::new(ReportGeneratorTool::new(ctx)),
        "semantic_search_tool" => Box::new(SemanticSearchTool::new(ctx)),
        "vector_cache_refresh_tool" => Box::new(VectorCacheRefreshTool::new(ctx)),
        "enhanced_report_tool" => Box::new(EnhancedReportTool::new(ctx)),
        "sv_documentation_tool" => Box::new(SvDocumentationTool::new(ctx)),
        "sv_process_guide_tool" => Box::new(SvProcessGuideTool::new(ctx)),
        _ => return None,
    };
    Some(tool)
}

/// A fresh registry holding the tools `role` may call.
pub fn toolset_for_role(role: UserRole, ctx: &ToolContext) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for name in tool_names_for_role(role) {
        if let Some(tool) = build_tool(name, ctx) {
            registry.register(tool);
        }
    }
    registry
}
