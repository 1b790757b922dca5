use super::Gallery;
use crate::error::GalleryResult;
use crate::ids::{MessageId, UserId};
use crate::message::{Message, MessageInput};

impl Gallery {
    /// Contact form submission. `sender` is set when the visitor is signed in.
    pub async fn send_message(&self, input: MessageInput, sender: Option<UserId>) -> GalleryResult<Message> {
        let input = input.validated()?;
        let message = self.store.insert_message(&input, sender).await?;
        tracing::info!(message_id = %message.id, "contact message received");
        Ok(message)
    }

    pub async fn messages(&self) -> GalleryResult<Vec<Message>> {
        Ok(self.store.messages().await?)
    }

    pub async fn mark_message_read(&self, id: MessageId) -> GalleryResult<Message> {
        Ok(self.store.mark_message_read(id).await?)
    }

    pub async fn unread_messages(&self) -> GalleryResult<i64> {
        Ok(self.store.unread_message_count().await?)
    }
}
