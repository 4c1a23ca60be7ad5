//! Report bodies computed from timetables and the completion log.
//!
//! Planned lessons for a class section are its PE periods times the number
//! of weeks the range touches.

use common::DatabaseError;
use database::Database;
use domain::{title_case, DateRange, Prop, TimetableEntry, UserRole};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct Tally {
    pub planned: u32,
    pub completed: u32,
}

impl Tally {
    pub fn pending(&self) -> u32 {
        self.planned.saturating_sub(self.completed)
    }

    pub fn success_rate(&self) -> f64 {
        if self.planned == 0 {
            return 0.0;
        }
        f64::from(self.completed) / f64::from(self.planned) * 100.0
    }
}

#[derive(Debug, Default)]
pub(crate) struct LessonStats {
    pub total: Tally,
    /// Keyed by (class, section)
    pub classes: BTreeMap<(String, String), Tally>,
    /// Sessions per prop type
    pub props_used: BTreeMap<String, u32>,
    /// Completions per resident
    pub residents: BTreeMap<String, u32>,
}

pub(crate) fn planned_periods(timetable: &[TimetableEntry], weeks: u32) -> u32 {
    timetable.iter().filter(|e| e.is_pe_period).count() as u32 * weeks
}

pub(crate) async fn lesson_stats(
    db: &dyn Database,
    school_id: &str,
    range: &DateRange,
) -> Result<LessonStats, DatabaseError> {
    let weeks = range.weeks();
    let timetable = db.get_timetable(school_id, None, None).await?;
    let completions = db.get_lesson_completions(Some(school_id), Some(range)).await?;
    let lessons: HashMap<String, Vec<String>> = db
        .get_lessons(None)
        .await?
        .into_iter()
        .map(|l| (l.lesson_id, l.required_props))
        .collect();

    let mut stats = LessonStats::default();
    for entry in timetable.iter().filter(|e| e.is_pe_period) {
        let tally = stats
            .classes
            .entry((entry.class.clone(), entry.section.clone()))
            .or_default();
        tally.planned += weeks;
        stats.total.planned += weeks;
    }

    for completion in &completions {
        let tally = stats
            .classes
            .entry((completion.class.clone(), completion.section.clone()))
            .or_default();
        tally.completed += 1;
        stats.total.completed += 1;
        *stats.residents.entry(completion.resident_id.clone()).or_default() += 1;

        if let Some(props) = lessons.get(&completion.lesson_id) {
            for prop in props {
                *stats.props_used.entry(title_case(prop)).or_default() += 1;
            }
        }
    }

    Ok(stats)
}

pub(crate) fn weekly_lessons(school_id: &str, range: &DateRange, stats: &LessonStats) -> String {
    let mut report = format!(
        "WEEKLY LESSONS REPORT\nSchool: {}\nPeriod: {}\n\n",
        school_id, range
    );

    let _ = writeln!(report, "Summary:");
    let _ = writeln!(report, "- Total lessons planned: {}", stats.total.planned);
    let _ = writeln!(report, "- Lessons completed: {}", stats.total.completed);
    let _ = writeln!(report, "- Lessons pending: {}", stats.total.pending());
    let _ = writeln!(report, "- Success rate: {:.0}%", stats.total.success_rate());

    report.push_str("\nDetails:\n");
    if stats.classes.is_empty() {
        report.push_str("- No PE periods scheduled\n");
    }
    for ((class, section), tally) in &stats.classes {
        let _ = writeln!(
            report,
            "- Class {}-{}: {}/{} lessons completed",
            class, section, tally.completed, tally.planned
        );
    }

    report.push_str("\nProps Used:\n");
    push_props_used(&mut report, stats);
    report
}

pub(crate) fn monthly_lessons(
    school_id: &str,
    range: &DateRange,
    stats: &LessonStats,
    props: &[Prop],
) -> String {
    let mut report = format!(
        "MONTHLY LESSONS REPORT\nSchool: {}\nPeriod: {}\n\n",
        school_id, range
    );

    let _ = writeln!(report, "Overall Performance:");
    let _ = writeln!(report, "- Total lessons planned: {}", stats.total.planned);
    let _ = writeln!(report, "- Lessons completed: {}", stats.total.completed);
    let _ = writeln!(report, "- Success rate: {:.0}%", stats.total.success_rate());
    let _ = writeln!(report, "- Active residents: {}", stats.residents.len());

    report.push_str("\nClass-wise Breakdown:\n");
    if stats.classes.is_empty() {
        report.push_str("- No PE periods scheduled\n");
    }
    for ((class, section), tally) in &stats.classes {
        let _ = writeln!(
            report,
            "- Class {}-{}: {}/{} completed",
            class, section, tally.completed, tally.planned
        );
    }

    report.push_str("\nProps Status:\n");
    let needing_attention: Vec<&Prop> = props
        .iter()
        .filter(|p| !p.status.eq_ignore_ascii_case("good"))
        .collect();
    if props.is_empty() {
        report.push_str("- No props recorded\n");
    } else if needing_attention.is_empty() {
        report.push_str("- All props in good condition\n");
    } else {
        for prop in needing_attention {
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

    report.push_str("\nProps Used:\n");
    push_props_used(&mut report, stats);

    report.push_str("\nResident Performance:\n");
    if stats.residents.is_empty() {
        report.push_str("- No lessons logged in this period\n");
    }
    for (resident_id, completed) in &stats.residents {
        let _ = writeln!(report, "- {}: {} lessons completed", resident_id, completed);
    }
    report
}

fn push_props_used(report: &mut String, stats: &LessonStats) {
    if stats.props_used.is_empty() {
        report.push_str("- No props recorded\n");
    }
    for (prop, sessions) in &stats.props_used {
        let _ = writeln!(report, "- {}: {} sessions", prop, sessions);
    }
}

pub(crate) fn prop_status(school_label: &str, date: &str, props: &[Prop]) -> String {
    let mut report = format!(
        "PROPS STATUS REPORT\nSchool: {}\nDate: {}\n\n",
        school_label, date
    );
    if props.is_empty() {
        report.push_str("No props found\n");
    }
    for prop in props {
        let _ = writeln!(report, "{}:", prop.display_type());
        let _ = writeln!(report, "  Total: {}", prop.quantity);
        let _ = writeln!(report, "  Available: {}", prop.available);
        let _ = writeln!(report, "  Status: {}", prop.status);
        let _ = writeln!(report, "  Utilization: {:.1}%\n", prop.utilization_percent());
    }
    report
}

/// Activity for the residents under `manager_id`, or for every resident
/// when no manager is given.
pub(crate) async fn resident_activity(
    db: &dyn Database,
    manager_id: Option<&str>,
    range: &DateRange,
) -> Result<String, DatabaseError> {
    let (residents, scope) = match manager_id {
        Some(manager_id) => (
            db.get_residents_under_manager(manager_id).await?,
            format!("Manager: {}", manager_id),
        ),
        None => (
            db.list_users()
                .await?
                .into_iter()
                .filter(|u| u.role == UserRole::Resident)
                .collect(),
            "Scope: All residents".to_string(),
        ),
    };
    let mut report = format!("RESIDENT ACTIVITY REPORT\n{}\nPeriod: {}\n\n", scope, range);

    if residents.is_empty() {
        match manager_id {
            Some(manager_id) => {
                let _ = writeln!(report, "No residents found under manager {}", manager_id);
            }
            None => report.push_str("No residents found\n"),
        }
        return Ok(report);
    }

    let completions = db.get_lesson_completions(None, Some(range)).await?;
    let weeks = range.weeks();
    let mut planned_by_school: HashMap<String, u32> = HashMap::new();

    for resident in &residents {
        let completed = completions
            .iter()
            .filter(|c| c.resident_id == resident.user_id)
            .count() as u32;
        let prop_updates = db
            .get_prop_updates(Some(&resident.user_id))
            .await?
            .iter()
            .filter(|u| range.contains(u.timestamp.date()))
            .count();

        let planned = match &resident.school_id {
            Some(school_id) => match planned_by_school.get(school_id) {
                Some(planned) => *planned,
                None => {
                    let timetable = db.get_timetable(school_id, None, None).await?;
                    let planned = planned_periods(&timetable, weeks);
                    planned_by_school.insert(school_id.clone(), planned);
                    planned
                }
            },
            None => 0,
        };
        let tally = Tally { planned, completed };

        let _ = writeln!(report, "Resident: {} ({})", resident.name, resident.user_id);
        if let Some(school_id) = &resident.school_id {
            let _ = writeln!(report, "  School: {}", school_id);
        }
        let _ = writeln!(report, "  Lessons completed: {}/{}", completed, planned);
        let _ = writeln!(report, "  Props reported: {} updates", prop_updates);
        let _ = writeln!(report, "  Performance: {}\n", performance_label(&tally));
    }

    Ok(report)
}

fn performance_label(tally: &Tally) -> &'static str {
    if tally.planned == 0 {
        return "No lessons scheduled";
    }
    match tally.success_rate() {
        r if r >= 90.0 => "Excellent",
        r if r >= 75.0 => "Good",
        _ => "Needs Attention",
    }
}

/// Mean utilization over all props, zero for an empty slice.
pub(crate) fn average_utilization(props: &[Prop]) -> f64 {
    if props.is_empty() {
        return 0.0;
    }
    props.iter().map(Prop::utilization_percent).sum::<f64>() / props.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(id: &str, kind: &str, quantity: u32, available: u32, status: &str) -> Prop {
        Prop {
            prop_id: id.into(),
            prop_type: kind.into(),
            school_id: "SCH001".into(),
            quantity,
            available,
            status: status.into(),
        }
    }

    #[test]
    fn test_tally_rates() {
        let tally = Tally {
            planned: 8,
            completed: 6,
        };
        assert_eq!(tally.pending(), 2);
        assert!((tally.success_rate() - 75.0).abs() < 1e-9);
        assert_eq!(performance_label(&tally), "Good");
        assert_eq!(performance_label(&Tally::default()), "No lessons scheduled");
        assert_eq!(
            Tally {
                planned: 2,
                completed: 3
            }
            .pending(),
            0
        );
    }

    #[test]
    fn test_prop_status_body() {
        let report = prop_status(
            "SCH001",
            "2024-10-05",
            &[prop("PROP001", "football", 10, 8, "good")],
        );
        assert!(report.starts_with("PROPS STATUS REPORT\nSchool: SCH001\nDate: 2024-10-05\n\n"));
        assert!(report.contains("Football:\n  Total: 10\n  Available: 8\n  Status: good\n  Utilization: 20.0%\n"));
    }

    #[test]
    fn test_average_utilization() {
        let props = [
            prop("PROP001", "football", 10, 8, "good"),
            prop("PROP002", "cones", 0, 0, "good"),
        ];
        assert!((average_utilization(&props) - 10.0).abs() < 1e-9);
        assert_eq!(average_utilization(&[]), 0.0);
    }
}
