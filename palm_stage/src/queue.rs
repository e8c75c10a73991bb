//! FIFO backlog of card content waiting for a palm-hold spawn.
//!
//! The compose side only appends; the controller only takes from the
//! front, one item per spawned card.

use std::collections::VecDeque;

use crate::color::Rgb;
use crate::media::MediaHandle;

/// Content for one future message card.
///
/// Empty text and a missing color fall back to the stage's card defaults
/// when the card is spawned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueueItem {
    pub text:     String,
    pub color:    Option<Rgb>,
    pub media:    Option<MediaHandle>,
    pub is_video: bool,
}

impl QueueItem {
    pub fn text(text: impl Into<String>, color: Rgb) -> Self {
        QueueItem { text: text.into(), color: Some(color), media: None, is_video: false }
    }

    /// Item with no content of its own; spawns the default card.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn with_media(text: impl Into<String>, color: Rgb, media: MediaHandle) -> Self {
        let is_video = media.is_video();
        QueueItem { text: text.into(), color: Some(color), media: Some(media), is_video }
    }
}

#[derive(Debug, Default)]
pub struct MessageQueue {
    pending:  VecDeque<QueueItem>,
    enqueued: usize,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, item: QueueItem) {
        self.pending.push_back(item);
        self.enqueued += 1;
    }

    pub fn dequeue(&mut self) -> Option<QueueItem> {
        self.pending.pop_front()
    }

    pub fn peek(&self) -> Option<&QueueItem> {
        self.pending.front()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Items consumed so far.
    pub fn consumed(&self) -> usize {
        self.enqueued - self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_and_counts() {
        let mut q = MessageQueue::new();
        q.enqueue(QueueItem::text("a", Rgb::WHITE));
        q.enqueue(QueueItem::text("b", Rgb::BLACK));
        assert_eq!(q.len(), 2);
        assert_eq!(q.dequeue().unwrap().text, "a");
        assert_eq!(q.consumed(), 1);
        assert_eq!(q.peek().unwrap().text, "b");
        assert_eq!(q.dequeue().unwrap().text, "b");
        assert!(q.dequeue().is_none());
        assert_eq!(q.consumed(), 2);
    }

    #[test]
    fn media_item_carries_video_flag() {
        let m = MediaHandle::video(1, 1, vec![vec![0], vec![1]], 40);
        let item = QueueItem::with_media("GIF", Rgb::WHITE, m);
        assert!(item.is_video);
    }
}
