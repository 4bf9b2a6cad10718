//! Deletion reminder rendering (HTML and plain text).

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Everything needed to render one reminder.
#[derive(Debug, Clone)]
pub struct ReminderEmailContext<'a> {
    pub name: &'a str,
    pub app_name: &'a str,
    pub days_before: u32,
    pub deletion_scheduled_at: DateTime<Utc>,
    /// IANA timezone name; falls back to UTC when missing or unparseable.
    pub timezone: Option<&'a str>,
    pub reactivation_url: &'a str,
    pub grace_period_days: u32,
}

#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Human countdown for a reminder window.
pub fn countdown_label(days_before: u32) -> String {
    match days_before {
        0 => "less than 24 hours".to_string(),
        1 => "1 day".to_string(),
        n => format!("{} days", n),
    }
}

/// Format the deletion date in the account's timezone, e.g. "March 4, 2026".
pub fn format_deletion_date(at: DateTime<Utc>, timezone: Option<&str>) -> String {
    let tz: Tz = timezone
        .and_then(|name| name.parse().ok())
        .unwrap_or(chrono_tz::UTC);
    at.with_timezone(&tz).format("%B %-d, %Y").to_string()
}

pub fn render_deletion_reminder(ctx: &ReminderEmailContext<'_>) -> RenderedEmail {
    let countdown = countdown_label(ctx.days_before);
    let date = format_deletion_date(ctx.deletion_scheduled_at, ctx.timezone);

    let subject = format!(
        "Your {} account will be deleted in {}",
        ctx.app_name, countdown
    );

    let text = format!(
        "Hi {name},\n\n\
         Your {app} account is scheduled for permanent deletion on {date} \
         ({countdown} from now), at the end of your {grace}-day grace period.\n\n\
         Once deleted, your data cannot be recovered.\n\n\
         To keep your account, reactivate your subscription here:\n{url}\n\n\
         — The {app} team\n",
        name = ctx.name,
        app = ctx.app_name,
        date = date,
        countdown = countdown,
        grace = ctx.grace_period_days,
        url = ctx.reactivation_url,
    );

    let html = format!(
        "<html><body>\
         <p>Hi {name},</p>\
         <p>Your {app} account is scheduled for <strong>permanent deletion</strong> \
         on <strong>{date}</strong> ({countdown} from now), at the end of your \
         {grace}-day grace period.</p>\
         <p>Once deleted, your data cannot be recovered.</p>\
         <p><a href=\"{url}\">Reactivate your subscription</a> to keep your account.</p>\
         <p>— The {app} team</p>\
         </body></html>",
        name = escape_html(ctx.name),
        app = escape_html(ctx.app_name),
        date = date,
        countdown = countdown,
        grace = ctx.grace_period_days,
        url = ctx.reactivation_url,
    );

    RenderedEmail {
        subject,
        html,
        text,
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, "less than 24 hours")]
    #[case(1, "1 day")]
    #[case(3, "3 days")]
    #[case(7, "7 days")]
    fn test_countdown_label(#[case] days: u32, #[case] expected: &str) {
        assert_eq!(countdown_label(days), expected);
    }

    #[test]
    fn test_deletion_date_uses_account_timezone() {
        // 02:00 UTC on March 5 is still March 4 in Los Angeles.
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 2, 0, 0).unwrap();
        assert_eq!(
            format_deletion_date(at, Some("America/Los_Angeles")),
            "March 4, 2026"
        );
        assert_eq!(format_deletion_date(at, None), "March 5, 2026");
        assert_eq!(format_deletion_date(at, Some("Not/AZone")), "March 5, 2026");
    }

    #[test]
    fn test_render_contains_required_parts() {
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let rendered = render_deletion_reminder(&ReminderEmailContext {
            name: "Ada",
            app_name: "Custodian",
            days_before: 7,
            deletion_scheduled_at: at,
            timezone: None,
            reactivation_url: "https://app.example.com/settings/subscription",
            grace_period_days: 30,
        });

        assert_eq!(
            rendered.subject,
            "Your Custodian account will be deleted in 7 days"
        );
        for body in [&rendered.html, &rendered.text] {
            assert!(body.contains("Ada"));
            assert!(body.contains("March 5, 2026"));
            assert!(body.contains("7 days"));
            assert!(body.contains("30-day grace period"));
            assert!(body.contains("https://app.example.com/settings/subscription"));
        }
    }

    #[test]
    fn test_html_escapes_display_name() {
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let rendered = render_deletion_reminder(&ReminderEmailContext {
            name: "<script>alert(1)</script>",
            app_name: "Custodian",
            days_before: 1,
            deletion_scheduled_at: at,
            timezone: None,
            reactivation_url: "https://app.example.com/settings/subscription",
            grace_period_days: 30,
        });
        assert!(!rendered.html.contains("<script>"));
        assert!(rendered.html.contains("&lt;script&gt;"));
    }
}
