//! Shared notification content
//!
//! Canonical content generators for expiry warnings, used by both production
//! (SES) and mock sinks.

use chrono::{DateTime, Utc};

fn format_expiry(expires_at: DateTime<Utc>) -> String {
    expires_at.format("%B %-d, %Y at %H:%M UTC").to_string()
}

/// Generate plain-text body for a photo expiry warning.
pub fn expiry_warning_text(
    client_name: &str,
    file_name: &str,
    expires_at: DateTime<Utc>,
    gallery_url: &str,
) -> String {
    format!(
        "Hi {},\n\n\
        Your photo '{}' will be removed from your gallery on {}.\n\n\
        Download it before then from:\n\
        {}\n\n\
        Thanks,\n\
        The Shutterdesk Team",
        client_name,
        file_name,
        format_expiry(expires_at),
        gallery_url
    )
}

/// Generate styled HTML body for a photo expiry warning.
pub fn expiry_warning_html(
    client_name: &str,
    file_name: &str,
    expires_at: DateTime<Utc>,
    gallery_url: &str,
) -> String {
    format!(
        r#"
            <html>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #b5462b;">Your photos will expire soon</h2>

                    <p>Hi {client_name},</p>

                    <p>Your photo '<strong>{file_name}</strong>' will be removed from your gallery on <strong>{expires}</strong>.</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{gallery_url}"
                           style="background-color: #b5462b; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block; font-weight: bold;">
                            Open Gallery
                        </a>
                    </div>

                    <p>Or copy and paste this link in your browser:</p>
                    <p style="background-color: #f5f5f5; padding: 10px; border-radius: 4px; word-break: break-all;">
                        <a href="{gallery_url}">{gallery_url}</a>
                    </p>

                    <hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">
                    <p style="color: #666; font-size: 12px;">Thanks, The Shutterdesk Team</p>
                </div>
            </body>
            </html>
            "#,
        client_name = client_name,
        file_name = file_name,
        expires = format_expiry(expires_at),
        gallery_url = gallery_url
    )
}

/// Short SMS variant of the expiry warning.
pub fn expiry_warning_sms(file_name: &str, expires_at: DateTime<Utc>, gallery_url: &str) -> String {
    format!(
        "Shutterdesk: '{}' expires {}. Download: {}",
        file_name,
        expires_at.format("%Y-%m-%d"),
        gallery_url
    )
}
