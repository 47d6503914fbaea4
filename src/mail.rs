//! # Mail delivery
//!
//! Sends compressed files as attachments using the EMAIL section of the
//! configuration. Delivery goes through the [`Delivery`] trait; the default
//! [`SmtpDelivery`] connects in plain text, upgrades with STARTTLS and logs
//! in with the configured credentials.
//!
//! ```rust,no_run
//! use pdfebc::config::paths::{ConfigPathProvider, UserConfigDir};
//! use pdfebc::mail::send_preconfigured;
//! use pdfebc::progress::Silent;
//!
//! let config_path = UserConfigDir.config_path()?;
//! send_preconfigured(&["out/paper.pdf"], &config_path, &Silent)?;
//! # Ok::<(), pdfebc::errors::PdfebcError>(())
//! ```

use std::fs;
use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::{Configuration, EMAIL_SECTION, EmailSettings, RECEIVER_KEY, SMTP_PORT_KEY, USER_KEY};
use crate::errors::{ConfigError, PdfebcError, Result};
use crate::progress::{ProgressSink, Status};

pub const SUBJECT: &str = "PDF files from pdfebc";
const ATTACHMENT_CONTENT_TYPE: &str = "application/octet-stream";

/// Hands a composed message to a mail server.
pub trait Delivery {
    fn deliver(&self, settings: &EmailSettings, message: &Message) -> Result<()>;
}

/// SMTP with a mandatory STARTTLS upgrade and login.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpDelivery;

impl Delivery for SmtpDelivery {
    fn deliver(&self, settings: &EmailSettings, message: &Message) -> Result<()> {
        let transport = SmtpTransport::starttls_relay(&settings.smtp_server)
            .map_err(|e| PdfebcError::Delivery(format!("{}: {}", settings.smtp_server, e)))?
            .port(settings.smtp_port)
            .credentials(Credentials::new(settings.user.clone(), settings.password.clone()))
            .build();

        log::info!("sending mail via {}:{}", settings.smtp_server, settings.smtp_port);
        transport.send(message).map_err(|e| {
            PdfebcError::Delivery(format!("{}:{}: {}", settings.smtp_server, settings.smtp_port, e))
        })?;
        Ok(())
    }
}

/// Send `file_paths` with the settings of the config at `config_path`.
pub fn send_preconfigured<P, C>(file_paths: &[P], config_path: C, sink: &dyn ProgressSink) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<Path>,
{
    send_preconfigured_with(file_paths, config_path, sink, &SmtpDelivery)
}

/// Like [`send_preconfigured`] with an explicit delivery backend.
pub fn send_preconfigured_with<P, C>(
    file_paths: &[P],
    config_path: C,
    sink: &dyn ProgressSink,
    delivery: &dyn Delivery,
) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<Path>,
{
    let config = Configuration::load(config_path)?;
    let settings = EmailSettings::from_config(&config)?;
    // shown as written in the file, not as parsed
    let smtp_port = config.get_required(EMAIL_SECTION, SMTP_PORT_KEY)?;
    let files: Vec<&Path> = file_paths.iter().map(AsRef::as_ref).collect();

    Status::Sending {
        from: &settings.user,
        to: &settings.receiver,
        smtp_server: &settings.smtp_server,
        smtp_port,
        files: &files,
    }
    .emit(sink);

    let message = compose_message(SUBJECT, "", &files, &settings)?;
    delivery.deliver(&settings, &message)?;

    Status::FilesSent.emit(sink);
    Ok(())
}

/// Compose a message from `config` and hand it to `delivery`.
pub fn send_with_attachments<P: AsRef<Path>>(
    subject: &str,
    body: &str,
    file_paths: &[P],
    config: &Configuration,
    delivery: &dyn Delivery,
) -> Result<()> {
    let settings = EmailSettings::from_config(config)?;
    let message = compose_message(subject, body, file_paths, &settings)?;
    delivery.deliver(&settings, &message)
}

/// Build a multipart message from the sender to the receiver with a text
/// body and one attachment per file, named after the file.
pub fn compose_message<P: AsRef<Path>>(
    subject: &str,
    body: &str,
    file_paths: &[P],
    settings: &EmailSettings,
) -> Result<Message> {
    let from = parse_mailbox(USER_KEY, &settings.user)?;
    let to = parse_mailbox(RECEIVER_KEY, &settings.receiver)?;
    let content_type = ContentType::parse(ATTACHMENT_CONTENT_TYPE)
        .map_err(|e| PdfebcError::InvalidInput(format!("{}: {}", ATTACHMENT_CONTENT_TYPE, e)))?;

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(body.to_string()));
    for path in file_paths {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PdfebcError::InvalidInput(format!("{} has no file name", path.display())))?;
        let data = fs::read(path)?;
        log::debug!("attaching {} ({} bytes)", name, data.len());
        parts = parts.singlepart(Attachment::new(name).body(data, content_type.clone()));
    }

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(parts)?;
    Ok(message)
}

fn parse_mailbox(key: &str, value: &str) -> Result<Mailbox> {
    value.parse::<Mailbox>().map_err(|_| {
        ConfigError::InvalidValue {
            section: EMAIL_SECTION.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}
