use crate::errors::AppError;
use crate::models::ContactMessage;
use crate::services::notify::Email;
use crate::state::AppState;

/// Forwards a contact-form message to the business inbox and sends the sender an auto-reply.
pub async fn send_contact_message(
    state: &AppState,
    message: ContactMessage,
) -> Result<(), AppError> {
    let message = message.validate()?;
    let notifier = state
        .notifier
        .as_deref()
        .ok_or(AppError::NotificationsDisabled)?;

    let business = &state.config.business_name;
    let to_business = business_email(&state.config.business_email, &message);
    let auto_reply = auto_reply_email(business, &message);

    notifier
        .send_email(&to_business)
        .await
        .map_err(|e| AppError::Notification(format!("{e:#}")))?;
    tracing::info!(from = %message.email, "forwarded contact message");

    notifier
        .send_email(&auto_reply)
        .await
        .map_err(|e| AppError::Notification(format!("{e:#}")))?;

    Ok(())
}

fn business_email(to: &str, m: &ContactMessage) -> Email {
    let (name, email, phone, body) = (
        escape_html(&m.name),
        escape_html(&m.email),
        escape_html(&m.phone),
        escape_html(&m.message),
    );
    Email {
        to: to.to_string(),
        subject: format!("New Contact Form Message from {}", m.name),
        html_body: format!(
            "<h2>New Contact Form Submission</h2>\
             <p><strong>Name:</strong> {name}</p>\
             <p><strong>Email:</strong> {email}</p>\
             <p><strong>Phone:</strong> {phone}</p>\
             <h3>Message:</h3><p>{body}</p>\
             <p><strong>Reply to:</strong> <a href=\"mailto:{email}\">{email}</a></p>"
        ),
        text_body: Some(format!(
            "New Contact Form Submission\n\nName: {}\nEmail: {}\nPhone: {}\n\nMessage:\n{}\n\nReply to: {}\n",
            m.name, m.email, m.phone, m.message, m.email
        )),
        reply_to: Some(m.email.clone()),
    }
}

fn auto_reply_email(business: &str, m: &ContactMessage) -> Email {
    let business_html = escape_html(business);
    Email {
        to: m.email.clone(),
        subject: format!("Thank you for contacting {business}"),
        html_body: format!(
            "<h2>Thank You for Contacting Us!</h2>\
             <p>Dear {},</p>\
             <p>We have received your message and will get back to you as soon as possible.</p>\
             <h3>Your Message:</h3><p>{}</p>\
             <p>Our team typically responds within 24 hours during business days.</p>\
             <p>Best regards,<br><strong>{business_html} Team</strong></p>",
            escape_html(&m.name),
            escape_html(&m.message),
        ),
        text_body: None,
        reply_to: None,
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
