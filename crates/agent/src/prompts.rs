//! System prompt and per-turn framing sent to the model.

use domain::{User, UserRole};

fn capabilities(role: UserRole) -> &'static str {
    match role {
        UserRole::HeadOffice => {
            "- System-wide oversight and reporting\n\
             - Access to all schools and data\n\
             - Generate executive reports and analytics\n\
             - Ensure accurate reporting to school principals"
        }
        UserRole::RegionalManager => {
            "- Manage multiple Delivery Managers\n\
             - Regional reporting and analytics\n\
             - Oversee resident performance"
        }
        UserRole::DeliveryManager | UserRole::DeliveryLead => {
            "- Manage residents in assigned schools\n\
             - Generate operational reports\n\
             - Monitor daily activities\n\
             - Track prop inventory across your schools"
        }
        UserRole::Resident => {
            "- View timetables and lesson plans for your assigned school\n\
             - Log lesson completions after each class\n\
             - Update props and equipment status\n\
             - Send standardized SMS updates to SV Head Office"
        }
        UserRole::Principal => {
            "- View school overview and reports\n\
             - Monitor sports program activities\n\
             - Read-only access to school data"
        }
    }
}

pub fn system_prompt(user: &User) -> String {
    format!(
        "You are the SportzVillage AI Assistant helping {name} ({role}).\n\n\
         SportzVillage manages school sports programs with this hierarchy:\n\
         - Head Office (HO) → Regional Manager (RM) → Delivery Manager (DM) → Residents (R)\n\
         - School Principals (PRINCIPAL) receive reports\n\n\
         Your role-specific capabilities:\n{capabilities}\n\n\
         CRITICAL RULES:\n\
         1. ACCURACY IS PARAMOUNT - No hallucinations allowed. All information must be factual.\n\
         2. Always verify data before providing information to stakeholders.\n\
         3. When unsure, ask clarifying questions rather than guessing.\n\
         4. Use the available tools to fetch real-time data.\n\
         5. Use semantic search when you need to find specific information.\n\
         6. Be concise but comprehensive in your responses.",
        name = user.name,
        role = user.role,
        capabilities = capabilities(user.role),
    )
}

/// The user turn as the model sees it: who is asking, the query and any
/// matching SV documentation.
pub fn enhanced_turn(user: &User, message: &str, documentation: &str) -> String {
    let documentation = if documentation.trim().is_empty() {
        "No specific SV documentation found for this query"
    } else {
        documentation
    };

    format!(
        "User: {} ({})\n\
         School: {}\n\
         Query: {}\n\n\
         SV OFFICIAL DOCUMENTATION CONTEXT:\n{}\n\n\
         Context: Use semantic search and available tools to provide accurate, contextual information.\n\
         Always reference SV documentation and standards when applicable.\n\
         If the query could benefit from semantic search across cached data, use the semantic_search_tool first.",
        user.name,
        user.role,
        user.school_label(),
        message,
        documentation
    )
}
