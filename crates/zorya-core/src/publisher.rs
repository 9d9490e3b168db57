//! Channel publishing: final HTML formatting, the channel-link footer, one
//! send per post. A failed send is logged upstream and never retried.

use std::sync::Arc;

use crate::domain::MessageRef;
use crate::formatting::to_channel_html;
use crate::messaging::{FormatMode, MessagingPort, SendOptions};
use crate::Result;

pub struct ChannelPublisher {
    messenger: Arc<dyn MessagingPort>,
    channel_link: String,
}

impl ChannelPublisher {
    pub fn new(messenger: Arc<dyn MessagingPort>, channel_link: impl Into<String>) -> Self {
        Self {
            messenger,
            channel_link: channel_link.into(),
        }
    }

    /// Format an assembled post body as HTML, append the channel footer and
    /// send it. One attempt; a transport failure propagates to the caller.
    pub async fn publish(&self, name: &str, body: &str) -> Result<MessageRef> {
        let mut html = to_channel_html(body);
        if !html.ends_with('\n') {
            html.push('\n');
        }
        html.push_str(&format!(
            "<a href=\"{}\">Код Долі📌</a>",
            self.channel_link
        ));
        let sent = self
            .messenger
            .send_to_channel(
                &html,
                FormatMode::Structural,
                SendOptions::default().without_preview(),
            )
            .await?;
        tracing::info!(post = name, message_id = sent.message_id.0, "channel post published");
        Ok(sent)
    }
}
