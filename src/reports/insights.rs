use crate::db::WindowSummary;

/// `"2 h 5 min"`, or `"45 min"` under an hour. Partial minutes are dropped.
pub fn format_screen_time(minutes: f64) -> String {
    let whole = minutes.max(0.0) as u64;
    let hours = whole / 60;
    let mins = whole % 60;
    if hours > 0 {
        format!("{hours} h {mins} min")
    } else {
        format!("{mins} min")
    }
}

/// Three paragraphs of advice: blink rate, screen time, drowsiness.
pub fn health_insights(summary: &WindowSummary, period: &str) -> String {
    let blink_rate = summary.average_blink_rate;
    let blink_advice = if blink_rate < 10.0 {
        "This is significantly below the healthy range of 15-20 blinks per minute, which may lead to dry eyes. Try to consciously blink more often."
    } else if blink_rate < 15.0 {
        "This is slightly below the healthy range of 15-20 blinks per minute. Consider using eye drops to maintain moisture."
    } else if blink_rate <= 20.0 {
        "This is within the healthy range of 15-20 blinks per minute. Keep up the good work!"
    } else {
        "This is above the typical range of 15-20 blinks per minute, which might indicate eye irritation or allergies."
    };

    let screen_hours = summary.total_session_minutes / 60.0;
    let screen_advice = if screen_hours > 8.0 {
        "This is a high amount of screen time. Consider reducing your screen exposure and taking more frequent breaks."
    } else if screen_hours > 5.0 {
        "This is a moderate amount of screen time. Remember to take regular breaks using the 20-20-20 rule."
    } else {
        "This is a reasonable amount of screen time. Continue taking regular breaks to maintain eye health."
    };

    let episodes = summary.drowsy_episodes;
    let drowsy_advice = if episodes > 5 {
        "This suggests you may be experiencing significant fatigue. Consider adjusting your sleep schedule or consulting a healthcare professional."
    } else if episodes > 2 {
        "This indicates occasional fatigue. Try to get more rest and take breaks when working for long periods."
    } else {
        "This suggests you're maintaining good alertness levels. Continue with your current rest patterns."
    };

    format!(
        "Your average blink rate {period} is {} blinks per minute. {blink_advice}\n\n\
         Your total screen time {period} is {}. {screen_advice}\n\n\
         You experienced {episodes} drowsy episodes {period}. {drowsy_advice}",
        blink_rate as i64,
        format_screen_time(summary.total_session_minutes),
    )
}
