//! Zone transitions as channel messages.
//!
//! [`channel_callbacks`] builds an enter/exit callback pair that forwards
//! transitions into an unbounded tokio channel, so a synchronous tick loop can
//! hand events to async consumers without blocking.

use crate::zone::{EnterCallback, ExitCallback, ZoneId};
use serde::Serialize;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ZoneEventKind {
    Enter { distance_mm: u16 },
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEvent {
    pub zone_id: ZoneId,
    pub zone: String,
    pub kind: ZoneEventKind,
    pub timestamp: SystemTime,
}

/// Printable form of a [`ZoneEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneEventRecord {
    pub zone_id: u32,
    pub zone: String,
    #[serde(flatten)]
    pub kind: ZoneEventKind,
    pub timestamp: String,
}

impl ZoneEventRecord {
    pub fn from_event(event: &ZoneEvent) -> Result<Self, time::error::Format> {
        Ok(Self {
            zone_id: event.zone_id.0,
            zone: event.zone.clone(),
            kind: event.kind,
            timestamp: format_timestamp(event.timestamp)?,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, time::error::Format> {
    OffsetDateTime::from(timestamp).format(&Rfc3339)
}

/// Callbacks that send a [`ZoneEvent`] per transition. A closed receiver is
/// not an error; the event is dropped.
pub fn channel_callbacks(
    zone_id: ZoneId,
    zone: impl Into<String>,
    tx: UnboundedSender<ZoneEvent>,
) -> (EnterCallback, ExitCallback) {
    let zone = zone.into();
    let enter_zone = zone.clone();
    let enter_tx = tx.clone();

    let on_enter: EnterCallback = Box::new(move |distance_mm| {
        send(
            &enter_tx,
            ZoneEvent {
                zone_id,
                zone: enter_zone.clone(),
                kind: ZoneEventKind::Enter { distance_mm },
                timestamp: SystemTime::now(),
            },
        );
    });
    let on_exit: ExitCallback = Box::new(move || {
        send(
            &tx,
            ZoneEvent {
                zone_id,
                zone: zone.clone(),
                kind: ZoneEventKind::Exit,
                timestamp: SystemTime::now(),
            },
        );
    });
    (on_enter, on_exit)
}

fn send(tx: &UnboundedSender<ZoneEvent>, event: ZoneEvent) {
    if let Err(err) = tx.send(event) {
        debug!(zone = %err.0.zone, "Event receiver closed, dropping zone event");
    }
}
