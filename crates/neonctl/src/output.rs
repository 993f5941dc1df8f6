//! Output formatting - ASCII-only terminal output

use neon_common::{AuthResponse, CompleteLessonResponse, HealthResponse, ProgressResponse};
use owo_colors::OwoColorize;

const BAR_WIDTH: usize = 25;

/// `[#########----------------]` for a percentage in [0, 100]
pub fn progress_bar(percent: f64, width: usize) -> String {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(empty))
}

/// Badge list for display, or a placeholder when empty
pub fn format_badges(badges: &[String]) -> String {
    if badges.is_empty() {
        "none yet".to_string()
    } else {
        badges.join(", ")
    }
}

pub fn display_auth(response: &AuthResponse) {
    println!("{}  {}", "[OK]".bright_green(), response.message);
    println!(
        "  {}  level {}  {} XP",
        response.user.username.bold(),
        response.user.level,
        response.user.xp
    );
}

pub fn display_progress(progress: &ProgressResponse) {
    println!();
    println!("{}", "[PROGRESS]".cyan());
    println!("  Level:    {}", progress.level.to_string().bold());
    println!("  XP:       {}", progress.xp);
    println!(
        "  Next:     {} {:.0}%  ({} XP to go)",
        progress_bar(progress.progress_to_next_level, BAR_WIDTH),
        progress.progress_to_next_level,
        progress.xp_to_next_level
    );
    println!("  Badges:   {}", format_badges(&progress.badges));
    println!("  Lessons:  {}", progress.lessons_completed.len());
    println!();
}

pub fn display_completion(response: &CompleteLessonResponse) {
    println!(
        "{}  {}  +{} XP",
        "[OK]".bright_green(),
        response.message,
        response.xp_earned
    );
    if let Some(level) = response.new_level {
        println!("{}  Level up! You reached level {}", "[LEVEL]".bright_magenta(), level);
        println!("  Badges: {}", format_badges(&response.progress.badges));
    }
    display_progress(&response.progress);
}

pub fn display_health(health: &HealthResponse) {
    println!(
        "{}  {} (v{}, up {}s)",
        "[OK]".bright_green(),
        health.message,
        health.version,
        health.uptime_seconds
    );
}

pub fn display_error(message: &str) {
    eprintln!("{}  {}", "[ERROR]".bright_red(), message);
}
