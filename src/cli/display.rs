use console::style;

use crate::mission::{Mission, Step};
use crate::registry::{LibraryReport, MissionSummary};

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_missions_table(&self, missions: &[MissionSummary]) {
        if missions.is_empty() {
            println!("{}", style("No missions found.").dim());
            return;
        }

        println!(
            "{:<8} {:<30} {:<8} {:<12}",
            style("ID").bold(),
            style("Name").bold(),
            style("Steps").bold(),
            style("Inspections").bold()
        );
        println!("{}", style("─".repeat(60)).dim());

        for mission in missions {
            let inspections = mission.steps.iter().filter(|s| s.is_inspection()).count();
            println!(
                "{:<8} {:<30} {:<8} {:<12}",
                mission.id.to_string(),
                truncate(&mission.name, 28),
                mission.steps.len(),
                inspections
            );
        }
    }

    pub fn print_mission_detail(&self, mission: &Mission) {
        self.print_header(&format!("Mission: {}", mission.id));

        if !mission.name.is_empty() {
            println!("Name:        {}", style(&mission.name).white().bold());
        }
        println!("Steps:       {}", mission.steps.len());
        println!("Inspections: {}", mission.inspection_count());
        println!();

        for (index, step) in mission.steps.iter().enumerate() {
            println!(
                "  {:>3}  {:<20} {}",
                index,
                style(step.kind()).cyan(),
                style(describe_step(step)).dim()
            );
        }
    }

    pub fn print_library_report(&self, report: &LibraryReport) {
        println!(
            "Files: {}  Valid: {}  Rejected: {}",
            report.files,
            style(report.valid.len()).green(),
            style(report.rejected.len()).red()
        );
        println!();

        for fault in &report.rejected {
            println!("  {} [{}] {}", style("✗").red(), fault.code(), fault);
        }
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_step(step: &Step) -> String {
    match step {
        Step::DriveTo { pose } => format!(
            "to ({:.2}, {:.2}, {:.2}) in {}",
            pose.position.x, pose.position.y, pose.position.z, pose.frame
        ),
        Step::TakeVideo { target, duration }
        | Step::TakeThermalVideo { target, duration }
        | Step::RecordAudio { target, duration } => format!(
            "at ({:.2}, {:.2}, {:.2}) in {} for {:.1}s",
            target.x, target.y, target.z, target.frame, duration
        ),
        Step::TakeImage { target } | Step::TakeThermalImage { target } => format!(
            "at ({:.2}, {:.2}, {:.2}) in {}",
            target.x, target.y, target.z, target.frame
        ),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{Frame, Position};

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("deck", 10), "deck");
        assert_eq!(truncate("ÅÅÅÅÅÅ", 4), "ÅÅÅ…");
    }

    #[test]
    fn test_describe_video_step() {
        let step = Step::TakeVideo {
            target: Position::new(1.0, 2.0, 3.0, Frame::Robot),
            duration: 5.0,
        };
        assert_eq!(
            describe_step(&step),
            "at (1.00, 2.00, 3.00) in robot for 5.0s"
        );
    }
}
