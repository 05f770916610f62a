//! Inquiry emails: landlord notification and renter confirmation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const SEND_EMAIL_PATH: &str = "webdevtoken.v1.WebDevService/SendEmail";
const SIGN_OFF: &str = "Rental Property Center";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email service not configured")]
    NotConfigured,
    #[error("Email request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Email service rejected the message ({status}): {detail}")]
    Rejected { status: u16, detail: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Sends and logs; a failed delivery never propagates.
pub async fn deliver(mailer: &dyn Mailer, message: &EmailMessage) -> bool {
    match mailer.send(message).await {
        Ok(()) => {
            log::info!("Sent \"{}\" to {}", message.subject, message.to);
            true
        }
        Err(e) => {
            log::warn!("Could not send \"{}\" to {}: {}", message.subject, message.to, e);
            false
        }
    }
}

/// Posts messages as JSON to the notification service.
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpMailer {
    pub fn new(
        api_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/{}", api_url.trim_end_matches('/'), SEND_EMAIL_PATH),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("connect-protocol-version", "1")
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }
}

/// Used when no email service is configured.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _message: &EmailMessage) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}

/// Renter details forwarded to the landlord.
#[derive(Debug, Clone, Copy)]
pub struct RenterDetails<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub message: &'a str,
}

pub fn landlord_notification(
    landlord_email: &str,
    landlord_name: &str,
    property_title: &str,
    renter: RenterDetails<'_>,
) -> EmailMessage {
    let phone = renter
        .phone
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p><b>Phone:</b> {}</p>", escape_html(p)))
        .unwrap_or_default();
    let message = escape_html(renter.message).replace('\n', "<br>");

    let body = format!(
        "<h1>New Inquiry for Your Property</h1>\
         <p>Hello {landlord},</p>\
         <p>You have received a new inquiry for your property:</p>\
         <p><b>Property:</b> {title}</p>\
         <h3>Renter Details:</h3>\
         <p><b>Name:</b> {name}</p>\
         <p><b>Email:</b> <a href=\"mailto:{email}\">{email}</a></p>\
         {phone}\
         <h3>Message:</h3>\
         <p>{message}</p>\
         <p>Please respond to the renter at your earliest convenience.</p>",
        landlord = escape_html(landlord_name),
        title = escape_html(property_title),
        name = escape_html(renter.name),
        email = escape_html(renter.email),
    );

    EmailMessage {
        to: landlord_email.to_string(),
        subject: format!("New Inquiry: {}", property_title),
        html: wrap(&body),
    }
}

pub fn renter_confirmation(
    renter_email: &str,
    renter_name: &str,
    property_title: &str,
    landlord_name: &str,
) -> EmailMessage {
    let body = format!(
        "<h1>Inquiry Received</h1>\
         <p>Hello {renter},</p>\
         <p>Thank you for your interest in the following property:</p>\
         <p><b>Property:</b> {title}</p>\
         <p><b>Landlord:</b> {landlord}</p>\
         <p>Your inquiry has been sent successfully. The landlord will review \
         your message and respond to you as soon as possible.</p>",
        renter = escape_html(renter_name),
        title = escape_html(property_title),
        landlord = escape_html(landlord_name),
    );

    EmailMessage {
        to: renter_email.to_string(),
        subject: format!("Inquiry Confirmation: {}", property_title),
        html: wrap(&body),
    }
}

fn wrap(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family: Arial, sans-serif; color: #333\">\
         <div style=\"max-width: 600px; margin: 0 auto; padding: 20px\">{}\
         <p>Best regards,<br>{}</p></div></body></html>",
        body, SIGN_OFF
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn renter() -> RenterDetails<'static> {
        RenterDetails {
            name: "Kata",
            email: "kata@example.com",
            phone: None,
            message: "Is it free\nfrom May?",
        }
    }

    #[test]
    fn landlord_notification_carries_renter_details() {
        let mail = landlord_notification("owner@example.com", "Gabor", "Sunny studio", renter());
        assert_eq!(mail.to, "owner@example.com");
        assert_eq!(mail.subject, "New Inquiry: Sunny studio");
        assert!(mail.html.contains("Hello Gabor,"));
        assert!(mail.html.contains("mailto:kata@example.com"));
        assert!(mail.html.contains("Is it free<br>from May?"));
        assert!(!mail.html.contains("Phone:"));
        assert!(mail.html.contains("Rental Property Center"));
    }

    #[test]
    fn phone_is_included_when_given() {
        let details = RenterDetails {
            phone: Some("+36 30 123 4567"),
            ..renter()
        };
        let mail = landlord_notification("owner@example.com", "Gabor", "Sunny studio", details);
        assert!(mail.html.contains("+36 30 123 4567"));
    }

    #[test]
    fn user_text_is_escaped() {
        let details = RenterDetails {
            name: "<script>alert(1)</script>",
            ..renter()
        };
        let mail = landlord_notification("owner@example.com", "Gabor", "A & B", details);
        assert!(!mail.html.contains("<script>"));
        assert!(mail.html.contains("&lt;script&gt;"));
        assert!(mail.html.contains("A &amp; B"));
    }

    #[test]
    fn renter_confirmation_names_landlord() {
        let mail = renter_confirmation("kata@example.com", "Kata", "Sunny studio", "Gabor");
        assert_eq!(mail.subject, "Inquiry Confirmation: Sunny studio");
        assert!(mail.html.contains("<b>Landlord:</b> Gabor"));
    }

    #[tokio::test]
    async fn disabled_mailer_reports_failure() {
        let mail = renter_confirmation("kata@example.com", "Kata", "Sunny studio", "Gabor");
        assert!(matches!(
            DisabledMailer.send(&mail).await,
            Err(MailError::NotConfigured)
        ));
        assert!(!deliver(&DisabledMailer, &mail).await);
    }
}
