//! The closed set of events a worker handles and the effects it asks of its host.

use bytes::Bytes;
use pulse_core::{Error, Request, Response, Strategy};
use url::Url;

use crate::controller::Worker;
use crate::message::Message;
use crate::push::Notification;

#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message(Message),
    Push(Option<Bytes>),
    Sync { tag: String },
    NotificationClick { action: Option<String> },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Install => "install",
            Event::Activate => "activate",
            Event::Fetch(_) => "fetch",
            Event::Message(_) => "message",
            Event::Push(_) => "push",
            Event::Sync { .. } => "sync",
            Event::NotificationClick { .. } => "notificationclick",
        }
    }
}

/// Something the host must do on the worker's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Answer the intercepted fetch with this response.
    Respond { strategy: Strategy, response: Response },
    /// Let the fetch go to the network untouched.
    PassThrough,
    SkipWaiting,
    ClaimClients,
    ShowNotification(Notification),
    CloseNotification,
    OpenWindow(Url),
    /// Reply to the posting page.
    Reply(serde_json::Value),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Respond { .. } => "respond",
            Effect::PassThrough => "pass_through",
            Effect::SkipWaiting => "skip_waiting",
            Effect::ClaimClients => "claim_clients",
            Effect::ShowNotification(_) => "show_notification",
            Effect::CloseNotification => "close_notification",
            Effect::OpenWindow(_) => "open_window",
            Effect::Reply(_) => "reply",
        }
    }
}

impl Worker {
    /// Route one event to its handler.
    pub async fn dispatch(&self, event: Event) -> Result<Vec<Effect>, Error> {
        tracing::debug!(event = event.name(), "dispatch");
        match event {
            Event::Install => self.install().await,
            Event::Activate => self.activate().await,
            Event::Fetch(request) => Ok(vec![self.handle_fetch(&request).await]),
            Event::Message(message) => self.handle_message(message).await,
            Event::Push(payload) => Ok(self.handle_push(payload.as_deref())),
            Event::Sync { tag } => self.handle_sync(&tag).await,
            Event::NotificationClick { action } => Ok(self.handle_notification_click(action.as_deref())),
        }
    }
}
